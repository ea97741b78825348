use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One historical draw, as stored and as consumed by the analysis engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub draw_date: NaiveDate,
    pub numbers: Vec<u8>,
    pub bonus: Vec<u8>,
    pub lottery: String,
}

impl DrawRecord {
    /// Main and bonus numbers are kept sorted ascending.
    pub fn new(draw_date: NaiveDate, mut numbers: Vec<u8>, mut bonus: Vec<u8>, lottery: impl Into<String>) -> Self {
        numbers.sort_unstable();
        bonus.sort_unstable();
        Self {
            draw_date,
            numbers,
            bonus,
            lottery: lottery.into(),
        }
    }

    pub fn contains(&self, n: u8) -> bool {
        self.numbers.contains(&n)
    }
}

/// A contiguous number pool `[min, max]` from which `pick` numbers are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub min: u8,
    pub max: u8,
    pub pick: usize,
}

impl Pool {
    pub fn new(min: u8, max: u8, pick: usize) -> Self {
        Self { min, max, pick }
    }

    pub fn size(&self) -> usize {
        if self.max < self.min {
            0
        } else {
            (self.max - self.min) as usize + 1
        }
    }

    pub fn pick_count(&self) -> usize {
        self.pick
    }

    pub fn contains(&self, n: u8) -> bool {
        n >= self.min && n <= self.max
    }

    /// Position of `n` in the pool, `None` when out of range.
    pub fn index_of(&self, n: u8) -> Option<usize> {
        self.contains(n).then(|| (n - self.min) as usize)
    }

    pub fn number_at(&self, idx: usize) -> u8 {
        self.min + idx as u8
    }

    pub fn numbers(&self) -> impl Iterator<Item = u8> {
        self.min..=self.max
    }

    /// `n` belongs to the low half when `n <= (min + max) / 2`.
    pub fn is_low(&self, n: u8) -> bool {
        2 * n as u32 <= self.min as u32 + self.max as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotteryProfile {
    pub key: &'static str,
    pub name: &'static str,
    pub min: u8,
    pub max: u8,
    pub numbers_per_draw: usize,
    pub bonus: Option<Pool>,
}

impl LotteryProfile {
    pub fn main_pool(&self) -> Pool {
        Pool::new(self.min, self.max, self.numbers_per_draw)
    }

    pub fn bonus_pool(&self) -> Option<Pool> {
        self.bonus
    }
}

pub const PROFILES: &[LotteryProfile] = &[
    LotteryProfile {
        key: "lotto_649",
        name: "Lotto 6/49",
        min: 1,
        max: 49,
        numbers_per_draw: 6,
        bonus: None,
    },
    LotteryProfile {
        key: "irish_lotto",
        name: "Irish Lotto",
        min: 1,
        max: 47,
        numbers_per_draw: 6,
        bonus: Some(Pool { min: 1, max: 47, pick: 1 }),
    },
    LotteryProfile {
        key: "uk_lotto",
        name: "UK Lotto",
        min: 1,
        max: 59,
        numbers_per_draw: 6,
        bonus: Some(Pool { min: 1, max: 59, pick: 1 }),
    },
    LotteryProfile {
        key: "euromillions",
        name: "EuroMillions",
        min: 1,
        max: 50,
        numbers_per_draw: 5,
        bonus: Some(Pool { min: 1, max: 12, pick: 2 }),
    },
    LotteryProfile {
        key: "powerball",
        name: "Powerball",
        min: 1,
        max: 69,
        numbers_per_draw: 5,
        bonus: Some(Pool { min: 1, max: 26, pick: 1 }),
    },
    LotteryProfile {
        key: "mega_millions",
        name: "Mega Millions",
        min: 1,
        max: 70,
        numbers_per_draw: 5,
        bonus: Some(Pool { min: 1, max: 25, pick: 1 }),
    },
];

pub fn find_profile(key: &str) -> Option<&'static LotteryProfile> {
    PROFILES.iter().find(|p| p.key.eq_ignore_ascii_case(key))
}

pub fn profile(key: &str) -> Result<&'static LotteryProfile> {
    find_profile(key).with_context(|| {
        let known: Vec<&str> = PROFILES.iter().map(|p| p.key).collect();
        format!("Unknown lottery '{}' (known: {})", key, known.join(", "))
    })
}

fn validate_numbers(numbers: &[u8], pool: &Pool, what: &str) -> Result<()> {
    if numbers.len() != pool.pick {
        bail!("Expected {} {} numbers, got {}", pool.pick, what, numbers.len());
    }
    for &n in numbers {
        if !pool.contains(n) {
            bail!("{} number {} out of range ({}-{})", what, n, pool.min, pool.max);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Duplicate {} number: {}", what, numbers[i]);
            }
        }
    }
    Ok(())
}

/// Checks a record against the rules of its lottery profile.
pub fn validate_draw(record: &DrawRecord, profile: &LotteryProfile) -> Result<()> {
    if !record.lottery.eq_ignore_ascii_case(profile.key) {
        bail!("Record lottery '{}' does not match profile '{}'", record.lottery, profile.key);
    }
    validate_numbers(&record.numbers, &profile.main_pool(), "main")?;

    match profile.bonus {
        None if !record.bonus.is_empty() => {
            bail!("Bonus numbers not expected for {}", profile.name);
        }
        None => Ok(()),
        Some(bonus_pool) => validate_numbers(&record.bonus, &bonus_pool, "bonus"),
    }
}

/// Parses `"1, 2,3"` into numbers, ignoring empty items.
pub fn parse_number_list(value: &str) -> Result<Vec<u8>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u8>().with_context(|| format!("Cannot parse number '{}'", s)))
        .collect()
}

pub fn format_number_list(numbers: &[u8]) -> String {
    numbers.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(",")
}
