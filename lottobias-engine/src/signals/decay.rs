use serde::Serialize;

use lottobias_db::models::{DrawRecord, Pool};
use crate::history::DrawHistory;

#[derive(Debug, Clone, Serialize)]
pub struct DecayReport {
    pub decay_factor: f64,
    pub momentum_split: usize,
    /// Share of the decayed weight mass in which each number appeared.
    pub frequency: Vec<f64>,
    /// Weighted frequency of the last K draws minus that of the K before.
    pub momentum: Vec<f64>,
}

/// Decay-weighted frequency over draws given newest first: the draw at age `a` weighs `d^a`.
fn weighted_frequency<'a>(newest_first: impl Iterator<Item = &'a DrawRecord>, pool: Pool, decay: f64) -> Vec<f64> {
    let mut scores = vec![0.0f64; pool.size()];
    let mut weight = 1.0f64;
    let mut total = 0.0f64;

    for draw in newest_first {
        for &n in &draw.numbers {
            if let Some(idx) = pool.index_of(n) {
                scores[idx] += weight;
            }
        }
        total += weight;
        weight *= decay;
    }

    if total > 0.0 {
        for s in &mut scores {
            *s /= total;
        }
    }
    scores
}

pub fn analyze_decay(history: &DrawHistory, decay_factor: f64, momentum_split: usize) -> DecayReport {
    let pool = history.pool();
    let draws = history.draws();

    let frequency = weighted_frequency(draws.iter().rev(), pool, decay_factor);

    let recent = weighted_frequency(draws.iter().rev().take(momentum_split), pool, decay_factor);
    let preceding_len = draws.len().saturating_sub(momentum_split).min(momentum_split);
    let momentum = if preceding_len == 0 {
        vec![0.0; pool.size()]
    } else {
        let preceding = weighted_frequency(
            draws.iter().rev().skip(momentum_split).take(momentum_split),
            pool,
            decay_factor,
        );
        recent.iter().zip(&preceding).map(|(r, p)| r - p).collect()
    };

    DecayReport {
        decay_factor,
        momentum_split,
        frequency,
        momentum,
    }
}
