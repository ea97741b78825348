use serde::Serialize;

use crate::config::BiasConfig;
use crate::scoring::{BiasModel, BiasScore, ScoreOutcome, SignalBreakdown};

/// Relative distance from the uniform share beyond which a number is tagged hot or cold.
pub const TAG_THRESHOLD: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Hot,
    Neutral,
    Cold,
}

impl Tag {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 1.0 + TAG_THRESHOLD {
            Tag::Hot
        } else if ratio < 1.0 - TAG_THRESHOLD {
            Tag::Cold
        } else {
            Tag::Neutral
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tag::Hot => write!(f, "HOT"),
            Tag::Neutral => write!(f, "-"),
            Tag::Cold => write!(f, "COLD"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedNumber {
    pub number: u8,
    pub score: f64,
    pub confidence: f64,
    pub signals: SignalBreakdown,
    pub tag: Tag,
    pub explanation: String,
}

fn strength_label(raw: f64) -> &'static str {
    if raw > 0.5 {
        "strong positive bias"
    } else if raw > 0.2 {
        "moderate positive bias"
    } else if raw > 0.0 {
        "slight positive bias"
    } else if raw < -0.5 {
        "strong negative bias"
    } else if raw < -0.2 {
        "moderate negative bias"
    } else {
        "neutral"
    }
}

fn explain(score: &BiasScore) -> String {
    match score.outcome {
        ScoreOutcome::Fallback { .. } => "insufficient evidence, uniform".to_string(),
        ScoreOutcome::Computed { raw_score, .. } => format!(
            "{}: seen {}x, last {} draws ago",
            strength_label(raw_score),
            score.stat.appearances,
            score.stat.gap
        ),
    }
}

/// Pool sorted by dampened score, highest first, ties broken by the smaller number.
pub fn rank(model: &BiasModel, config: &BiasConfig) -> Vec<RankedNumber> {
    let uniform = 1.0 / model.pool.size() as f64;

    let mut ranked: Vec<RankedNumber> = model
        .scores
        .iter()
        .filter(|s| s.outcome.confidence() >= config.min_confidence)
        .map(|s| RankedNumber {
            number: s.number,
            score: s.dampened,
            confidence: s.outcome.confidence(),
            signals: s.signals,
            tag: Tag::from_ratio(s.dampened / uniform),
            explanation: explain(s),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.number.cmp(&b.number))
    });

    if let Some(top) = config.top {
        ranked.truncate(top);
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::{scenario_history, scenario_pool};
    use crate::history::DrawHistory;
    use crate::scoring::score_history;

    fn scenario_config() -> BiasConfig {
        let mut config = BiasConfig::for_pool(scenario_pool());
        config.decay_factor = 1.0;
        config.weights.pair = 0.0;
        config.weights.momentum = 0.0;
        config
    }

    #[test]
    fn test_scenario_ranking_order() {
        let config = scenario_config();
        let model = score_history(&scenario_history(), &config);
        let ranked = rank(&model, &config);
        assert_eq!(ranked.len(), 14);
        let mut top4: Vec<u8> = ranked[..4].iter().map(|r| r.number).collect();
        top4.sort();
        assert_eq!(top4, vec![1, 2, 3, 4]);
        assert!(ranked[3].score > ranked[4].score);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_uniform_ties_by_number() {
        let config = scenario_config();
        let model = score_history(&DrawHistory::empty("test", scenario_pool()), &config);
        let ranked = rank(&model, &config);
        let numbers: Vec<u8> = ranked.iter().map(|r| r.number).collect();
        assert_eq!(numbers, (1..=14).collect::<Vec<u8>>());
        assert!(ranked.iter().all(|r| r.tag == Tag::Neutral));
        assert_eq!(ranked[0].explanation, "insufficient evidence, uniform");
    }

    #[test]
    fn test_top_and_min_confidence() {
        let mut config = scenario_config();
        let model = score_history(&scenario_history(), &config);

        config.top = Some(3);
        assert_eq!(rank(&model, &config).len(), 3);

        config.top = None;
        config.min_confidence = 0.001;
        let ranked = rank(&model, &config);
        assert!(ranked.iter().all(|r| r.confidence >= 0.001));
        assert!(ranked.iter().all(|r| r.number != 5 && r.number != 6));
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let config = scenario_config();
        let model = score_history(&scenario_history(), &config);
        let a: Vec<u8> = rank(&model, &config).iter().map(|r| r.number).collect();
        let b: Vec<u8> = rank(&model, &config).iter().map(|r| r.number).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tags() {
        assert_eq!(Tag::from_ratio(1.5), Tag::Hot);
        assert_eq!(Tag::from_ratio(1.2), Tag::Neutral);
        assert_eq!(Tag::from_ratio(0.5), Tag::Cold);
    }

    #[test]
    fn test_strength_labels() {
        assert_eq!(strength_label(0.8), "strong positive bias");
        assert_eq!(strength_label(0.3), "moderate positive bias");
        assert_eq!(strength_label(0.05), "slight positive bias");
        assert_eq!(strength_label(0.0), "neutral");
        assert_eq!(strength_label(-0.3), "moderate negative bias");
        assert_eq!(strength_label(-0.9), "strong negative bias");
    }
}
