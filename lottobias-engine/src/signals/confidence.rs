use serde::Serialize;

use crate::history::DrawHistory;
use super::{appearance_counts, relative_deviation};

/// Below this many draws no split-half comparison is possible and confidence is 0.
pub const MIN_DRAWS_FOR_CONFIDENCE: usize = 2;

#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceReport {
    pub window: usize,
    pub appearances: Vec<u32>,
    /// |deviation(older half) - deviation(newer half)|
    pub split_half_gap: Vec<f64>,
    pub confidence: Vec<f64>,
}

/// Sample-size shrinkage `n / (n + k)`.
pub fn shrinkage(appearances: u32, regularization_k: f64) -> f64 {
    let n = appearances as f64;
    if n + regularization_k <= 0.0 {
        0.0
    } else {
        n / (n + regularization_k)
    }
}

/// Confidence per number over the long window.
///
/// `coverage` scales everything down when the short trend window could not be filled.
pub fn estimate_confidence(
    history: &DrawHistory,
    long_window: Option<usize>,
    regularization_k: f64,
    tolerance: f64,
    coverage: f64,
) -> ConfidenceReport {
    let pool = history.pool();
    let window = history.latest(long_window.unwrap_or(history.len()));
    let appearances = appearance_counts(window, pool);

    if window.len() < MIN_DRAWS_FOR_CONFIDENCE {
        return ConfidenceReport {
            window: window.len(),
            appearances,
            split_half_gap: vec![0.0; pool.size()],
            confidence: vec![0.0; pool.size()],
        };
    }

    let (older, newer) = window.split_at(window.len() / 2);
    let older_dev = relative_deviation(older, pool);
    let newer_dev = relative_deviation(newer, pool);
    let split_half_gap: Vec<f64> = older_dev.iter().zip(&newer_dev).map(|(a, b)| (a - b).abs()).collect();

    let confidence = appearances
        .iter()
        .zip(&split_half_gap)
        .map(|(&n, &gap)| {
            let stability = 1.0 - (gap / tolerance).min(1.0);
            (shrinkage(n, regularization_k) * stability * coverage).clamp(0.0, 1.0)
        })
        .collect();

    ConfidenceReport {
        window: window.len(),
        appearances,
        split_half_gap,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::{make_history, scenario_history, scenario_pool, synthetic_history};
    use lottobias_db::models::Pool;

    #[test]
    fn test_shrinkage() {
        assert_eq!(shrinkage(0, 10.0), 0.0);
        assert!((shrinkage(10, 10.0) - 0.5).abs() < 1e-12);
        assert_eq!(shrinkage(3, 0.0), 1.0);
        assert_eq!(shrinkage(0, 0.0), 0.0);
        assert!(shrinkage(1000, 10.0) > shrinkage(100, 10.0));
    }

    #[test]
    fn test_empty_history_zero_confidence() {
        let h = crate::history::DrawHistory::empty("test", scenario_pool());
        let report = estimate_confidence(&h, None, 10.0, 2.0, 1.0);
        assert!(report.confidence.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_single_draw_zero_confidence() {
        let h = make_history(scenario_pool(), &[vec![1, 2, 3, 4, 5, 6]]);
        let report = estimate_confidence(&h, None, 0.0, 2.0, 1.0);
        assert!(report.confidence.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_scenario_confidence() {
        let h = scenario_history();
        let report = estimate_confidence(&h, None, 10.0, 2.0, 1.0);
        // halves: [draw1] and [draw2, draw3]
        let older = 1.0 / (6.0 / 14.0) - 1.0;
        let newer = 1.0 / (12.0 / 14.0) - 1.0;
        assert!((report.split_half_gap[0] - (older - newer)).abs() < 1e-12);
        let expected = 2.0 / 12.0 * (1.0 - (older - newer) / 2.0);
        assert!((report.confidence[0] - expected).abs() < 1e-12);
        // 5 and 6 swing from hot to absent: fully penalised
        assert_eq!(report.confidence[4], 0.0);
    }

    #[test]
    fn test_coverage_scales_confidence() {
        let h = scenario_history();
        let full = estimate_confidence(&h, None, 10.0, 2.0, 1.0);
        let partial = estimate_confidence(&h, None, 10.0, 2.0, 0.5);
        assert!((partial.confidence[0] - full.confidence[0] * 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_grows_with_history() {
        let pool = Pool::new(1, 20, 4);
        let small = estimate_confidence(&synthetic_history(pool, 20, 5), None, 10.0, 2.0, 1.0);
        let large = estimate_confidence(&synthetic_history(pool, 2000, 5), None, 10.0, 2.0, 1.0);
        let mean = |c: &[f64]| c.iter().sum::<f64>() / c.len() as f64;
        assert!(mean(&large.confidence) > mean(&small.confidence));
        assert!(large.confidence.iter().all(|&c| (0.0..=1.0).contains(&c)));
    }

    #[test]
    fn test_long_window_limits_sample() {
        let h = synthetic_history(Pool::new(1, 20, 4), 100, 9);
        let report = estimate_confidence(&h, Some(10), 10.0, 2.0, 1.0);
        assert_eq!(report.window, 10);
        assert_eq!(report.appearances.iter().sum::<u32>(), 40);
    }
}
