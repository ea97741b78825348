use serde::Serialize;

use lottobias_db::models::Pool;

use crate::config::{BiasConfig, SignalWeights};
use crate::history::DrawHistory;
use crate::signals::confidence::estimate_confidence;
use crate::signals::decay::analyze_decay;
use crate::signals::gaps;
use crate::signals::pairs::PairLiftTable;
use crate::signals::trend::analyze_trend;

/// The four signals of one number, each a zero-centred deviation from uniform.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SignalBreakdown {
    pub trend: f64,
    pub decay: f64,
    pub momentum: f64,
    pub pair: f64,
}

impl SignalBreakdown {
    pub fn combine(&self, w: &SignalWeights) -> f64 {
        w.trend * self.trend + w.decay * self.decay + w.momentum * self.momentum + w.pair * self.pair
    }
}

/// Raw per-number aggregates the signals are derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberStat {
    pub number: u8,
    pub appearances: u32,
    pub gap: u32,
    pub short_deviation: f64,
    pub long_deviation: f64,
    pub acceleration: f64,
    pub decay_frequency: f64,
    pub momentum: f64,
    pub pair_lift: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScoreOutcome {
    Computed {
        raw_score: f64,
        raw_probability: f64,
        confidence: f64,
    },
    /// No usable evidence: the number keeps the uniform share.
    Fallback { uniform_score: f64 },
}

impl ScoreOutcome {
    pub fn confidence(&self) -> f64 {
        match self {
            ScoreOutcome::Computed { confidence, .. } => *confidence,
            ScoreOutcome::Fallback { .. } => 0.0,
        }
    }

    pub fn raw_score(&self) -> f64 {
        match self {
            ScoreOutcome::Computed { raw_score, .. } => *raw_score,
            ScoreOutcome::Fallback { .. } => 0.0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ScoreOutcome::Fallback { .. })
    }

    /// `raw_probability * c + uniform * (1 - c)`, before renormalization.
    pub fn blend(&self, uniform: f64) -> f64 {
        match *self {
            ScoreOutcome::Computed {
                raw_probability,
                confidence,
                ..
            } => raw_probability * confidence + uniform * (1.0 - confidence),
            ScoreOutcome::Fallback { uniform_score } => uniform_score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BiasScore {
    pub number: u8,
    pub outcome: ScoreOutcome,
    /// Final probability; sums to 1 over the pool.
    pub dampened: f64,
    pub signals: SignalBreakdown,
    pub stat: NumberStat,
}

#[derive(Debug, Clone, Serialize)]
pub struct BiasModel {
    pub lottery: String,
    pub pool: Pool,
    pub history_len: usize,
    pub short_window: usize,
    pub long_window: usize,
    pub scores: Vec<BiasScore>,
    #[serde(skip)]
    pub pairs: PairLiftTable,
}

impl BiasModel {
    /// Dampened probabilities indexed by pool position.
    pub fn distribution(&self) -> Vec<f64> {
        self.scores.iter().map(|s| s.dampened).collect()
    }

    pub fn probability(&self, n: u8) -> f64 {
        self.pool.index_of(n).map_or(0.0, |idx| self.scores[idx].dampened)
    }

    pub fn score_of(&self, n: u8) -> Option<&BiasScore> {
        self.pool.index_of(n).map(|idx| &self.scores[idx])
    }

    /// True when no number carries any evidence.
    pub fn is_uniform(&self) -> bool {
        self.scores.iter().all(|s| s.outcome.is_fallback())
    }

    pub fn mean_confidence(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().map(|s| s.outcome.confidence()).sum::<f64>() / self.scores.len() as f64
    }
}

/// Maps raw scores onto the simplex: `max(0, 1 + r)` normalized, uniform if nothing is left.
fn raw_probabilities(raw: &[f64]) -> Vec<f64> {
    let clipped: Vec<f64> = raw.iter().map(|r| (1.0 + r).max(0.0)).collect();
    let total: f64 = clipped.iter().sum();
    if total > 0.0 && total.is_finite() {
        clipped.iter().map(|c| c / total).collect()
    } else {
        vec![1.0 / raw.len() as f64; raw.len()]
    }
}

/// Runs every analyzer over `history` and blends the signals into a dampened distribution.
pub fn score_history(history: &DrawHistory, config: &BiasConfig) -> BiasModel {
    let pool = history.pool();
    let size = pool.size();
    let uniform = 1.0 / size as f64;
    let scale = size as f64 / pool.pick as f64;

    let trend = analyze_trend(history, config.short_window, config.long_window);
    let decay = analyze_decay(history, config.decay_factor, config.momentum_split);
    let pairs = PairLiftTable::from_history(history);
    let pair_lift = pairs.pair_signals(config.pair_top_m);
    let confidence = estimate_confidence(
        history,
        config.long_window,
        config.regularization_k,
        config.variance_tolerance,
        trend.coverage,
    );
    let gaps = gaps(history.latest(trend.long_window), pool);

    let signals: Vec<SignalBreakdown> = (0..size)
        .map(|i| SignalBreakdown {
            trend: trend.short[i],
            decay: if history.is_empty() { 0.0 } else { decay.frequency[i] * scale - 1.0 },
            momentum: decay.momentum[i] * scale,
            pair: pair_lift[i] - 1.0,
        })
        .collect();
    let raw: Vec<f64> = signals.iter().map(|s| s.combine(&config.weights)).collect();
    let raw_prob = raw_probabilities(&raw);

    let outcomes: Vec<ScoreOutcome> = (0..size)
        .map(|i| {
            let c = confidence.confidence[i];
            if c <= 0.0 {
                ScoreOutcome::Fallback { uniform_score: uniform }
            } else {
                ScoreOutcome::Computed {
                    raw_score: raw[i],
                    raw_probability: raw_prob[i],
                    confidence: c,
                }
            }
        })
        .collect();

    let blended: Vec<f64> = outcomes.iter().map(|o| o.blend(uniform)).collect();
    let total: f64 = blended.iter().sum();

    let scores = (0..size)
        .map(|i| BiasScore {
            number: pool.number_at(i),
            outcome: outcomes[i],
            dampened: if total > 0.0 { blended[i] / total } else { uniform },
            signals: signals[i],
            stat: NumberStat {
                number: pool.number_at(i),
                appearances: confidence.appearances[i],
                gap: gaps[i],
                short_deviation: trend.short[i],
                long_deviation: trend.long[i],
                acceleration: trend.acceleration[i],
                decay_frequency: decay.frequency[i],
                momentum: decay.momentum[i],
                pair_lift: pair_lift[i],
            },
        })
        .collect();

    BiasModel {
        lottery: history.lottery().to_string(),
        pool,
        history_len: history.len(),
        short_window: trend.short_window,
        long_window: trend.long_window,
        scores,
        pairs,
    }
}
