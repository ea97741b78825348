use serde::{Deserialize, Serialize};

use lottobias_db::models::Pool;

use crate::error::{config_error, Result};

/// Linear weights of the four bias signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub trend: f64,
    pub decay: f64,
    pub momentum: f64,
    pub pair: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            trend: 0.35,
            decay: 0.25,
            momentum: 0.20,
            pair: 0.20,
        }
    }
}

impl SignalWeights {
    fn iter(&self) -> [(&'static str, f64); 4] {
        [
            ("trend", self.trend),
            ("decay", self.decay),
            ("momentum", self.momentum),
            ("pair", self.pair),
        ]
    }
}

/// Inclusive `[min, max]` count band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub min: usize,
    pub max: usize,
}

impl Band {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Distance to the band, 0 when inside.
    pub fn deficit(&self, value: usize) -> usize {
        if value < self.min {
            self.min - value
        } else {
            value.saturating_sub(self.max)
        }
    }
}

/// Soft constraints checked on every generated line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConstraints {
    /// Allowed count of odd numbers.
    pub odd_band: Option<Band>,
    /// Allowed count of numbers in the low half of the pool.
    pub low_band: Option<Band>,
    pub sum_range: Option<(u32, u32)>,
    /// Longest allowed run of consecutive integers.
    pub max_consecutive: Option<usize>,
}

impl LineConstraints {
    pub fn none() -> Self {
        Self::default()
    }

    /// Odd/even and low/high kept within `[k/3, k - k/3]`, runs of at most 3.
    pub fn balanced(pick: usize) -> Self {
        let band = Band::new(pick / 3, pick - pick / 3);
        Self {
            odd_band: Some(band),
            low_band: Some(band),
            sum_range: None,
            max_consecutive: Some(3),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Ranking,
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

impl Preset {
    /// Shrinkage strength and pair boosting for the preset.
    pub fn apply(self, config: &mut BiasConfig) {
        let (k, boost) = match self {
            Preset::Conservative => (20.0, 0.20),
            Preset::Balanced => (10.0, 0.35),
            Preset::Aggressive => (4.0, 0.60),
        };
        config.regularization_k = k;
        config.pair_boost = boost;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasConfig {
    pub pool_min: u8,
    pub pool_max: u8,
    pub numbers_per_draw: usize,

    pub short_window: usize,
    /// `None` uses the whole history.
    pub long_window: Option<usize>,

    pub decay_factor: f64,
    pub momentum_split: usize,

    pub regularization_k: f64,
    pub variance_tolerance: f64,

    pub weights: SignalWeights,
    pub pair_top_m: usize,

    pub constraints: LineConstraints,
    pub max_repair_attempts: usize,
    pub num_lines: usize,
    pub rng_seed: Option<u64>,
    pub mode: Mode,
    /// Numbers forced into every generated line.
    pub locked: Vec<u8>,
    /// Multiplicative boost for candidates with high lift against already picked numbers.
    pub pair_boost: f64,

    /// Ranking output limit, `None` keeps the whole pool.
    pub top: Option<usize>,
    pub min_confidence: f64,
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self::for_pool(Pool::new(1, 49, 6))
    }
}

impl BiasConfig {
    pub fn for_pool(pool: Pool) -> Self {
        Self {
            pool_min: pool.min,
            pool_max: pool.max,
            numbers_per_draw: pool.pick,
            short_window: 20,
            long_window: None,
            decay_factor: 0.95,
            momentum_split: 10,
            regularization_k: 10.0,
            variance_tolerance: 2.0,
            weights: SignalWeights::default(),
            pair_top_m: 5,
            constraints: LineConstraints::balanced(pool.pick),
            max_repair_attempts: 50,
            num_lines: 5,
            rng_seed: None,
            mode: Mode::Ranking,
            locked: Vec::new(),
            pair_boost: 0.0,
            top: None,
            min_confidence: 0.0,
        }
    }

    pub fn pool(&self) -> Pool {
        Pool::new(self.pool_min, self.pool_max, self.numbers_per_draw)
    }

    /// Same analysis settings over a bonus pool, without locks or line constraints.
    pub fn for_bonus(&self, pool: Pool) -> Self {
        Self {
            pool_min: pool.min,
            pool_max: pool.max,
            numbers_per_draw: pool.pick,
            constraints: LineConstraints::none(),
            locked: Vec::new(),
            pair_boost: 0.0,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_min > self.pool_max {
            return Err(config_error(format!(
                "pool_min {} is greater than pool_max {}",
                self.pool_min, self.pool_max
            )));
        }
        let size = self.pool().size();
        if self.numbers_per_draw == 0 || self.numbers_per_draw > size {
            return Err(config_error(format!(
                "numbers_per_draw must be in 1..={}, got {}",
                size, self.numbers_per_draw
            )));
        }
        if self.short_window == 0 {
            return Err(config_error("short_window must be at least 1"));
        }
        if self.long_window == Some(0) {
            return Err(config_error("long_window must be at least 1"));
        }
        if !self.decay_factor.is_finite() || self.decay_factor <= 0.0 || self.decay_factor > 1.0 {
            return Err(config_error(format!(
                "decay_factor must be in (0, 1], got {}",
                self.decay_factor
            )));
        }
        if self.momentum_split == 0 {
            return Err(config_error("momentum_split must be at least 1"));
        }
        if !self.regularization_k.is_finite() || self.regularization_k < 0.0 {
            return Err(config_error(format!(
                "regularization_k must be non-negative, got {}",
                self.regularization_k
            )));
        }
        if !self.variance_tolerance.is_finite() || self.variance_tolerance <= 0.0 {
            return Err(config_error(format!(
                "variance_tolerance must be positive, got {}",
                self.variance_tolerance
            )));
        }
        for (name, w) in self.weights.iter() {
            if !w.is_finite() || w < 0.0 {
                return Err(config_error(format!("weight '{}' must be non-negative, got {}", name, w)));
            }
        }
        if !self.pair_boost.is_finite() || self.pair_boost < 0.0 {
            return Err(config_error(format!("pair_boost must be non-negative, got {}", self.pair_boost)));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(config_error(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }
        self.validate_constraints()?;
        self.validate_locked()
    }

    fn validate_constraints(&self) -> Result<()> {
        let c = &self.constraints;
        for (name, band) in [("odd_band", c.odd_band), ("low_band", c.low_band)] {
            if let Some(b) = band {
                if b.min > b.max {
                    return Err(config_error(format!("{} is empty ({} > {})", name, b.min, b.max)));
                }
            }
        }
        if let Some((lo, hi)) = c.sum_range {
            if lo > hi {
                return Err(config_error(format!("sum_range is empty ({} > {})", lo, hi)));
            }
        }
        if c.max_consecutive == Some(0) {
            return Err(config_error("max_consecutive must be at least 1"));
        }
        Ok(())
    }

    fn validate_locked(&self) -> Result<()> {
        let pool = self.pool();
        if self.locked.len() > self.numbers_per_draw {
            return Err(config_error(format!(
                "too many locked numbers: {} > numbers_per_draw ({})",
                self.locked.len(),
                self.numbers_per_draw
            )));
        }
        for (i, &n) in self.locked.iter().enumerate() {
            if !pool.contains(n) {
                return Err(config_error(format!(
                    "locked number {} out of range ({}-{})",
                    n, pool.min, pool.max
                )));
            }
            if self.locked[..i].contains(&n) {
                return Err(config_error(format!("locked number {} given twice", n)));
            }
        }
        Ok(())
    }
}
