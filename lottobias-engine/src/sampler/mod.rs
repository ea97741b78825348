pub mod constraints;
pub mod lines;
pub mod ranking;

use chrono::Datelike;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use serde::Serialize;

use lottobias_db::models::Pool;

use crate::config::{BiasConfig, Mode};
use crate::error::{config_error, Result};
use crate::scoring::BiasModel;

pub use lines::{generate_lines, GeneratedLine};
pub use ranking::{rank, RankedNumber, Tag};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", content = "items", rename_all = "lowercase")]
pub enum Generated {
    Ranking(Vec<RankedNumber>),
    Lines(Vec<GeneratedLine>),
}

/// Deterministic seed from today's date (YYYYMMDD).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

/// Seed from the config, or a fresh one from the thread RNG.
pub fn base_seed(config: &BiasConfig) -> u64 {
    config.rng_seed.unwrap_or_else(|| rand::rng().random())
}

/// Index drawn proportionally to `weights`; uniform when no weight is positive.
pub(crate) fn weighted_pick<R: Rng>(weights: &[f64], rng: &mut R) -> Result<usize> {
    let total: f64 = weights.iter().sum();
    if !weights.is_empty() && !(total > 0.0 && total.is_finite()) {
        return Ok(rng.random_range(0..weights.len()));
    }
    let dist = WeightedIndex::new(weights)?;
    Ok(dist.sample(rng))
}

pub(crate) fn check_model_pool(model_pool: Pool, config: &BiasConfig) -> Result<()> {
    if model_pool != config.pool() {
        return Err(config_error(format!(
            "model pool {}-{} pick {} does not match configured pool {}-{} pick {}",
            model_pool.min,
            model_pool.max,
            model_pool.pick,
            config.pool_min,
            config.pool_max,
            config.numbers_per_draw
        )));
    }
    Ok(())
}

/// Ranking or lines, depending on `config.mode`.
pub fn generate(model: &BiasModel, config: &BiasConfig) -> Result<Generated> {
    config.validate()?;
    check_model_pool(model.pool, config)?;
    match config.mode {
        Mode::Ranking => Ok(Generated::Ranking(rank(model, config))),
        Mode::Lines => Ok(Generated::Lines(generate_lines(model, None, config)?)),
    }
}
