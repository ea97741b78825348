use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::BiasConfig;
use crate::error::Result;
use crate::scoring::BiasModel;

use super::constraints::{ConstraintKind, ConstraintSet};
use super::{base_seed, check_model_pool, weighted_pick};

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedLine {
    pub numbers: Vec<u8>,
    pub bonus: Vec<u8>,
    /// Repairs ran out (or nothing could be evicted) before every constraint held.
    pub constraints_relaxed: bool,
    pub repairs: usize,
    pub unmet: Vec<ConstraintKind>,
    pub seed: u64,
    /// Product of `p / uniform` over the picked numbers.
    pub score: f64,
}

/// Pair boost of `candidate` against the numbers already on the line.
fn pair_factor(model: &BiasModel, line: &[u8], candidate: u8, boost: f64) -> f64 {
    if boost <= 0.0 || line.is_empty() {
        return 1.0;
    }
    let bonus: f64 = line
        .iter()
        .map(|&s| (model.pairs.lift(s, candidate) - 1.0).clamp(0.0, 2.0))
        .sum();
    1.0 + boost * bonus
}

fn draw_candidate(
    model: &BiasModel,
    line: &[u8],
    candidates: &[u8],
    pair_boost: f64,
    rng: &mut ChaCha20Rng,
) -> Result<u8> {
    let weights: Vec<f64> = candidates
        .iter()
        .map(|&c| model.probability(c) * pair_factor(model, line, c, pair_boost))
        .collect();
    let idx = weighted_pick(&weights, rng)?;
    Ok(candidates[idx])
}

/// Weighted draw of `count` numbers without replacement, with the `p / uniform` score.
fn sample_without_replacement(model: &BiasModel, count: usize, rng: &mut ChaCha20Rng) -> Result<(Vec<u8>, f64)> {
    let uniform = 1.0 / model.pool.size() as f64;
    let mut available: Vec<u8> = model.pool.numbers().collect();
    let mut selected = Vec::with_capacity(count);
    let mut score = 1.0f64;

    for _ in 0..count.min(available.len()) {
        let weights: Vec<f64> = available.iter().map(|&n| model.probability(n)).collect();
        let idx = weighted_pick(&weights, rng)?;
        let number = available.remove(idx);
        score *= model.probability(number) / uniform;
        selected.push(number);
    }

    selected.sort_unstable();
    Ok((selected, score))
}

/// Builds one line from its own RNG stream.
pub fn generate_line(model: &BiasModel, bonus: Option<&BiasModel>, config: &BiasConfig, seed: u64) -> Result<GeneratedLine> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let pool = model.pool;
    let rules = ConstraintSet::new(&config.constraints, pool);

    let mut line: Vec<u8> = config.locked.clone();
    while line.len() < pool.pick {
        let candidates: Vec<u8> = pool.numbers().filter(|n| !line.contains(n)).collect();
        let n = draw_candidate(model, &line, &candidates, config.pair_boost, &mut rng)?;
        line.push(n);
    }

    let mut repairs = 0;
    let mut relaxed = false;
    loop {
        let violations = rules.violations(&line);
        let Some(v) = violations.first() else {
            break;
        };
        if repairs >= config.max_repair_attempts {
            relaxed = true;
            break;
        }

        let victim = rules
            .offenders(v, &line)
            .into_iter()
            .filter(|n| !config.locked.contains(n))
            .min_by(|&a, &b| {
                model
                    .probability(a)
                    .partial_cmp(&model.probability(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.cmp(&a))
            });
        let Some(victim) = victim else {
            relaxed = true;
            break;
        };

        line.retain(|&n| n != victim);
        let rest: Vec<u8> = pool
            .numbers()
            .filter(|&n| n != victim && !line.contains(&n))
            .collect();
        if rest.is_empty() {
            line.push(victim);
            relaxed = true;
            break;
        }
        let improving: Vec<u8> = rest.iter().copied().filter(|&c| rules.improves(v, &line, c)).collect();
        let choices = if improving.is_empty() { &rest } else { &improving };
        let n = draw_candidate(model, &line, choices, config.pair_boost, &mut rng)?;
        line.push(n);
        repairs += 1;
    }

    line.sort_unstable();
    let unmet: Vec<ConstraintKind> = rules.violations(&line).iter().map(|v| v.kind).collect();
    if relaxed {
        log::warn!(
            "line {:?} (seed {}) relaxed after {} repairs, unmet: {:?}",
            line,
            seed,
            repairs,
            unmet
        );
    }

    let uniform = 1.0 / pool.size() as f64;
    let mut score: f64 = line.iter().map(|&n| model.probability(n) / uniform).product();

    let bonus_numbers = match bonus {
        Some(bonus_model) => {
            let (numbers, bonus_score) = sample_without_replacement(bonus_model, bonus_model.pool.pick, &mut rng)?;
            score *= bonus_score;
            numbers
        }
        None => Vec::new(),
    };

    Ok(GeneratedLine {
        numbers: line,
        bonus: bonus_numbers,
        constraints_relaxed: relaxed,
        repairs,
        unmet,
        seed,
        score,
    })
}

/// `config.num_lines` lines; line `i` uses seed `base + i` so the parallel run matches a sequential one.
pub fn generate_lines(model: &BiasModel, bonus: Option<&BiasModel>, config: &BiasConfig) -> Result<Vec<GeneratedLine>> {
    config.validate()?;
    check_model_pool(model.pool, config)?;

    let base = base_seed(config);
    log::debug!("generating {} lines from base seed {}", config.num_lines, base);

    (0..config.num_lines)
        .into_par_iter()
        .map(|i| generate_line(model, bonus, config, base.wrapping_add(i as u64)))
        .collect()
}
