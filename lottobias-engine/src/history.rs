use lottobias_db::models::{DrawRecord, Pool};

use crate::error::{EngineError, Result};

/// Chronologically ordered draws of a single lottery, oldest first.
#[derive(Debug, Clone)]
pub struct DrawHistory {
    lottery: String,
    pool: Pool,
    draws: Vec<DrawRecord>,
}

impl DrawHistory {
    /// Builds a history, rejecting records that break the pool rules or the date order.
    pub fn new(lottery: impl Into<String>, pool: Pool, draws: Vec<DrawRecord>) -> Result<Self> {
        let lottery = lottery.into();
        for (i, draw) in draws.iter().enumerate() {
            check_record(i, draw, &lottery, &pool)?;
            if i > 0 && draws[i - 1].draw_date > draw.draw_date {
                return Err(EngineError::History(format!(
                    "draw {} ({}) is older than draw {} ({})",
                    i,
                    draw.draw_date,
                    i - 1,
                    draws[i - 1].draw_date
                )));
            }
        }
        Ok(Self { lottery, pool, draws })
    }

    pub fn empty(lottery: impl Into<String>, pool: Pool) -> Self {
        Self {
            lottery: lottery.into(),
            pool,
            draws: Vec::new(),
        }
    }

    pub fn lottery(&self) -> &str {
        &self.lottery
    }

    pub fn pool(&self) -> Pool {
        self.pool
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// The `n` most recent draws, still in chronological order.
    pub fn latest(&self, n: usize) -> &[DrawRecord] {
        let start = self.draws.len().saturating_sub(n);
        &self.draws[start..]
    }

    /// History of the bonus balls, drawn from `bonus_pool`.
    ///
    /// Draws without a complete bonus set are skipped.
    pub fn bonus_history(&self, bonus_pool: Pool) -> DrawHistory {
        let draws = self
            .draws
            .iter()
            .filter(|d| d.bonus.len() == bonus_pool.pick && d.bonus.iter().all(|&b| bonus_pool.contains(b)))
            .map(|d| DrawRecord::new(d.draw_date, d.bonus.clone(), Vec::new(), d.lottery.clone()))
            .collect();
        DrawHistory {
            lottery: self.lottery.clone(),
            pool: bonus_pool,
            draws,
        }
    }
}

fn check_record(i: usize, draw: &DrawRecord, lottery: &str, pool: &Pool) -> Result<()> {
    let fail = |msg: String| Err(EngineError::History(format!("draw {} ({}): {}", i, draw.draw_date, msg)));

    if !draw.lottery.eq_ignore_ascii_case(lottery) {
        return fail(format!("belongs to lottery '{}', expected '{}'", draw.lottery, lottery));
    }
    if draw.numbers.len() != pool.pick {
        return fail(format!("{} numbers, expected {}", draw.numbers.len(), pool.pick));
    }
    for (j, &n) in draw.numbers.iter().enumerate() {
        if !pool.contains(n) {
            return fail(format!("number {} out of range ({}-{})", n, pool.min, pool.max));
        }
        if draw.numbers[..j].contains(&n) {
            return fail(format!("duplicate number {}", n));
        }
    }
    Ok(())
}
