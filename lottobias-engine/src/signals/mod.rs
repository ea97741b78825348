pub mod confidence;
pub mod decay;
pub mod pairs;
pub mod trend;

use lottobias_db::models::{DrawRecord, Pool};

/// Number of draws each pool number appears in.
pub fn appearance_counts(draws: &[DrawRecord], pool: Pool) -> Vec<u32> {
    let mut counts = vec![0u32; pool.size()];
    for draw in draws {
        for &n in &draw.numbers {
            if let Some(idx) = pool.index_of(n) {
                counts[idx] += 1;
            }
        }
    }
    counts
}

/// Observed / expected - 1 per number, expected = `len * pick / size`.
///
/// An empty window carries no evidence and yields 0 everywhere.
pub fn relative_deviation(draws: &[DrawRecord], pool: Pool) -> Vec<f64> {
    let expected = draws.len() as f64 * pool.pick as f64 / pool.size() as f64;
    if expected <= 0.0 {
        return vec![0.0; pool.size()];
    }
    appearance_counts(draws, pool)
        .into_iter()
        .map(|observed| observed as f64 / expected - 1.0)
        .collect()
}

/// Draws elapsed since each number was last seen (0 = in the latest draw).
/// Numbers never drawn get the window length.
pub fn gaps(draws: &[DrawRecord], pool: Pool) -> Vec<u32> {
    let mut gaps = vec![draws.len() as u32; pool.size()];
    for (age, draw) in draws.iter().rev().enumerate() {
        for &n in &draw.numbers {
            if let Some(idx) = pool.index_of(n) {
                if gaps[idx] == draws.len() as u32 {
                    gaps[idx] = age as u32;
                }
            }
        }
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::{scenario_history, scenario_pool};

    #[test]
    fn test_appearance_counts_scenario() {
        let h = scenario_history();
        let counts = appearance_counts(h.draws(), h.pool());
        assert_eq!(&counts[..4], &[2, 2, 2, 2]);
        assert!(counts[4..].iter().all(|&c| c == 1));
        assert_eq!(counts.iter().sum::<u32>(), 18);
    }

    #[test]
    fn test_relative_deviation_sums_to_zero() {
        let h = scenario_history();
        let dev = relative_deviation(h.draws(), h.pool());
        let expected = 3.0 * 6.0 / 14.0;
        assert!((dev[0] - (2.0 / expected - 1.0)).abs() < 1e-12);
        assert!(dev.iter().sum::<f64>().abs() < 1e-9);
    }

    #[test]
    fn test_relative_deviation_empty() {
        let dev = relative_deviation(&[], scenario_pool());
        assert_eq!(dev, vec![0.0; 14]);
    }

    #[test]
    fn test_gaps() {
        let h = scenario_history();
        let g = gaps(h.draws(), h.pool());
        assert_eq!(g[0], 1); // 1 last seen in draw 2
        assert_eq!(g[2], 0); // 3 in the latest draw
        assert_eq!(g[4], 2); // 5 only in the oldest draw
    }
}
