use serde::Serialize;

use lottobias_db::models::Pool;
use crate::history::DrawHistory;

/// Co-occurrence counts for every unordered pair of the pool, stored as an upper triangle.
#[derive(Debug, Clone, Serialize)]
pub struct PairLiftTable {
    pool: Pool,
    counts: Vec<u32>,
    expected: f64,
    draws: usize,
}

impl PairLiftTable {
    pub fn from_history(history: &DrawHistory) -> Self {
        let pool = history.pool();
        let s = pool.size();
        let k = pool.pick;

        let mut table = Self {
            pool,
            counts: vec![0u32; s * s.saturating_sub(1) / 2],
            expected: 0.0,
            draws: history.len(),
        };

        let mut indices = Vec::with_capacity(k);
        for draw in history.draws() {
            indices.clear();
            indices.extend(draw.numbers.iter().filter_map(|&n| pool.index_of(n)));
            indices.sort_unstable();
            for a in 0..indices.len() {
                for b in (a + 1)..indices.len() {
                    let slot = table.slot(indices[a], indices[b]);
                    table.counts[slot] += 1;
                }
            }
        }

        if s > 1 && k > 1 {
            let p_pair = (k * (k - 1)) as f64 / (s * (s - 1)) as f64;
            table.expected = p_pair * history.len() as f64;
        }
        table
    }

    /// Triangle offset of the pair `i < j`.
    fn slot(&self, i: usize, j: usize) -> usize {
        let s = self.pool.size();
        i * (2 * s - i - 1) / 2 + (j - i - 1)
    }

    fn ordered(&self, a: u8, b: u8) -> Option<(usize, usize)> {
        let (i, j) = (self.pool.index_of(a)?, self.pool.index_of(b)?);
        match i.cmp(&j) {
            std::cmp::Ordering::Less => Some((i, j)),
            std::cmp::Ordering::Greater => Some((j, i)),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn pool(&self) -> Pool {
        self.pool
    }

    /// Expected co-occurrences of any pair under independence.
    pub fn expected(&self) -> f64 {
        self.expected
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn count(&self, a: u8, b: u8) -> u32 {
        self.ordered(a, b).map_or(0, |(i, j)| self.counts[self.slot(i, j)])
    }

    /// Observed / expected co-occurrence; 1.0 when nothing is expected.
    pub fn lift(&self, a: u8, b: u8) -> f64 {
        if self.expected <= 0.0 {
            return 1.0;
        }
        match self.ordered(a, b) {
            Some((i, j)) => self.counts[self.slot(i, j)] as f64 / self.expected,
            None => 1.0,
        }
    }

    /// Mean lift of `n` with its `m` strongest partners.
    pub fn top_partner_lift(&self, n: u8, m: usize) -> f64 {
        let m = m.min(self.pool.size().saturating_sub(1));
        if m == 0 {
            return 1.0;
        }
        let mut lifts: Vec<f64> = self
            .pool
            .numbers()
            .filter(|&other| other != n)
            .map(|other| self.lift(n, other))
            .collect();
        lifts.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        lifts.iter().take(m).sum::<f64>() / m as f64
    }

    pub fn pair_signals(&self, m: usize) -> Vec<f64> {
        self.pool.numbers().map(|n| self.top_partner_lift(n, m)).collect()
    }

    /// Pairs sorted by lift descending, then by count.
    pub fn strongest_pairs(&self, limit: usize) -> Vec<(u8, u8, f64)> {
        let s = self.pool.size();
        let mut pairs = Vec::with_capacity(self.counts.len());
        for i in 0..s {
            for j in (i + 1)..s {
                let (a, b) = (self.pool.number_at(i), self.pool.number_at(j));
                pairs.push((a, b, self.lift(a, b), self.counts[self.slot(i, j)]));
            }
        }
        pairs.sort_by(|x, y| {
            y.2.partial_cmp(&x.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(y.3.cmp(&x.3))
        });
        pairs.into_iter().take(limit).map(|(a, b, lift, _)| (a, b, lift)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::{scenario_history, scenario_pool, synthetic_history};

    #[test]
    fn test_pair_counts_scenario() {
        let table = PairLiftTable::from_history(&scenario_history());
        assert_eq!(table.count(1, 2), 2);
        assert_eq!(table.count(2, 1), 2);
        assert_eq!(table.count(3, 4), 2);
        assert_eq!(table.count(1, 3), 1);
        assert_eq!(table.count(1, 14), 0);
        assert_eq!(table.count(5, 5), 0);
    }

    #[test]
    fn test_expected_and_lift() {
        let table = PairLiftTable::from_history(&scenario_history());
        let expected = 30.0 / 182.0 * 3.0;
        assert!((table.expected() - expected).abs() < 1e-12);
        assert!((table.lift(1, 2) - 2.0 / expected).abs() < 1e-12);
        assert_eq!(table.lift(1, 14), 0.0);
        assert_eq!(table.lift(7, 7), 1.0);
    }

    #[test]
    fn test_lift_neutral_when_nothing_expected() {
        let h = crate::history::DrawHistory::empty("test", scenario_pool());
        let table = PairLiftTable::from_history(&h);
        assert_eq!(table.lift(1, 2), 1.0);
        assert_eq!(table.top_partner_lift(1, 5), 1.0);

        let single = synthetic_history(Pool::new(1, 10, 1), 30, 1);
        let table = PairLiftTable::from_history(&single);
        assert_eq!(table.expected(), 0.0);
        assert_eq!(table.lift(1, 2), 1.0);
    }

    #[test]
    fn test_top_partner_lift() {
        let table = PairLiftTable::from_history(&scenario_history());
        let expected = table.expected();
        // 1 co-occurs twice with 2, once with 3..10
        assert!((table.top_partner_lift(1, 1) - 2.0 / expected).abs() < 1e-12);
        assert!((table.top_partner_lift(1, 2) - 1.5 / expected).abs() < 1e-12);
        assert_eq!(table.top_partner_lift(1, 0), 1.0);
        // m larger than the pool is clamped to the 13 partners
        let all = table.top_partner_lift(1, 100);
        assert!((all - 10.0 / 13.0 / expected).abs() < 1e-12);
    }

    #[test]
    fn test_lift_near_one_on_uniform_history() {
        let h = synthetic_history(Pool::new(1, 10, 3), 20_000, 42);
        let table = PairLiftTable::from_history(&h);
        for a in 1..=10u8 {
            for b in (a + 1)..=10u8 {
                let lift = table.lift(a, b);
                assert!((lift - 1.0).abs() < 0.15, "lift({a},{b}) = {lift}");
            }
        }
    }

    #[test]
    fn test_strongest_pairs() {
        let table = PairLiftTable::from_history(&scenario_history());
        let top = table.strongest_pairs(2);
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].0, top[0].1), (1, 2));
        assert_eq!((top[1].0, top[1].1), (3, 4));
    }
}
