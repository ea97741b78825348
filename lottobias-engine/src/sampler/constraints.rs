use serde::Serialize;

use lottobias_db::models::Pool;

use crate::config::LineConstraints;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    OddEven,
    HighLow,
    SumRange,
    MaxConsecutive,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintKind::OddEven => write!(f, "odd/even"),
            ConstraintKind::HighLow => write!(f, "high/low"),
            ConstraintKind::SumRange => write!(f, "sum"),
            ConstraintKind::MaxConsecutive => write!(f, "consecutive"),
        }
    }
}

/// Which side of the allowed range a line falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Excess {
    TooMany,
    TooFew,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub kind: ConstraintKind,
    pub excess: Excess,
    pub deficit: u32,
}

pub struct ConstraintSet<'a> {
    rules: &'a LineConstraints,
    pool: Pool,
}

fn is_odd(n: u8) -> bool {
    n % 2 == 1
}

/// Lengths of maximal runs of consecutive integers, with their first element.
fn runs(line: &[u8]) -> Vec<(u8, usize)> {
    let mut sorted = line.to_vec();
    sorted.sort_unstable();
    let mut runs: Vec<(u8, usize)> = Vec::new();
    for n in sorted {
        match runs.last_mut() {
            Some((start, len)) if *start as usize + *len == n as usize => *len += 1,
            _ => runs.push((n, 1)),
        }
    }
    runs
}

fn band_violation(kind: ConstraintKind, value: usize, min: usize, max: usize) -> Option<Violation> {
    if value < min {
        Some(Violation { kind, excess: Excess::TooFew, deficit: (min - value) as u32 })
    } else if value > max {
        Some(Violation { kind, excess: Excess::TooMany, deficit: (value - max) as u32 })
    } else {
        None
    }
}

impl<'a> ConstraintSet<'a> {
    pub fn new(rules: &'a LineConstraints, pool: Pool) -> Self {
        Self { rules, pool }
    }

    fn check(&self, kind: ConstraintKind, line: &[u8]) -> Option<Violation> {
        match kind {
            ConstraintKind::OddEven => {
                let band = self.rules.odd_band?;
                let odds = line.iter().filter(|&&n| is_odd(n)).count();
                band_violation(kind, odds, band.min, band.max)
            }
            ConstraintKind::HighLow => {
                let band = self.rules.low_band?;
                let lows = line.iter().filter(|&&n| self.pool.is_low(n)).count();
                band_violation(kind, lows, band.min, band.max)
            }
            ConstraintKind::SumRange => {
                let (lo, hi) = self.rules.sum_range?;
                let sum: u32 = line.iter().map(|&n| n as u32).sum();
                band_violation(kind, sum as usize, lo as usize, hi as usize)
            }
            ConstraintKind::MaxConsecutive => {
                let limit = self.rules.max_consecutive?;
                let over: usize = runs(line).iter().map(|&(_, len)| len.saturating_sub(limit)).sum();
                (over > 0).then_some(Violation { kind, excess: Excess::TooMany, deficit: over as u32 })
            }
        }
    }

    /// Deficit of one constraint, 0 when satisfied or not configured.
    pub fn deficit(&self, kind: ConstraintKind, line: &[u8]) -> u32 {
        self.check(kind, line).map_or(0, |v| v.deficit)
    }

    /// Unmet constraints in a fixed order.
    pub fn violations(&self, line: &[u8]) -> Vec<Violation> {
        [
            ConstraintKind::OddEven,
            ConstraintKind::HighLow,
            ConstraintKind::SumRange,
            ConstraintKind::MaxConsecutive,
        ]
        .into_iter()
        .filter_map(|kind| self.check(kind, line))
        .collect()
    }

    /// Members of `line` whose removal works towards fixing `v`.
    pub fn offenders(&self, v: &Violation, line: &[u8]) -> Vec<u8> {
        match (v.kind, v.excess) {
            (ConstraintKind::OddEven, Excess::TooMany) => line.iter().copied().filter(|&n| is_odd(n)).collect(),
            (ConstraintKind::OddEven, Excess::TooFew) => line.iter().copied().filter(|&n| !is_odd(n)).collect(),
            (ConstraintKind::HighLow, Excess::TooMany) => line.iter().copied().filter(|&n| self.pool.is_low(n)).collect(),
            (ConstraintKind::HighLow, Excess::TooFew) => line.iter().copied().filter(|&n| !self.pool.is_low(n)).collect(),
            (ConstraintKind::SumRange, excess) => {
                let mean = line.iter().map(|&n| n as f64).sum::<f64>() / line.len().max(1) as f64;
                line.iter()
                    .copied()
                    .filter(|&n| match excess {
                        Excess::TooMany => n as f64 >= mean,
                        Excess::TooFew => n as f64 <= mean,
                    })
                    .collect()
            }
            (ConstraintKind::MaxConsecutive, _) => {
                let limit = self.rules.max_consecutive.unwrap_or(usize::MAX);
                runs(line)
                    .into_iter()
                    .filter(|&(_, len)| len > limit)
                    .flat_map(|(start, len)| (0..len).map(move |i| start + i as u8))
                    .collect()
            }
        }
    }

    /// Whether putting `candidate` into `partial` (a line with one member evicted)
    /// leaves constraint `v.kind` closer to satisfied than before the eviction.
    pub fn improves(&self, v: &Violation, partial: &[u8], candidate: u8) -> bool {
        let mut trial = partial.to_vec();
        trial.push(candidate);
        self.deficit(v.kind, &trial) < v.deficit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Band;

    fn pool() -> Pool {
        Pool::new(1, 49, 6)
    }

    #[test]
    fn test_runs() {
        assert_eq!(runs(&[5, 1, 2, 3, 9, 10]), vec![(1, 3), (5, 1), (9, 2)]);
        assert_eq!(runs(&[]), vec![]);
    }

    #[test]
    fn test_balanced_line_passes() {
        let rules = LineConstraints::balanced(6);
        let set = ConstraintSet::new(&rules, pool());
        assert!(set.violations(&[3, 10, 17, 28, 35, 44]).is_empty());
    }

    #[test]
    fn test_odd_even_violation() {
        let rules = LineConstraints::balanced(6);
        let set = ConstraintSet::new(&rules, pool());
        let line = [1, 3, 5, 27, 29, 31];
        let v = set.violations(&line);
        assert_eq!(v[0].kind, ConstraintKind::OddEven);
        assert_eq!(v[0].excess, Excess::TooMany);
        assert_eq!(v[0].deficit, 2);
        assert_eq!(set.offenders(&v[0], &line).len(), 6);
        assert!(set.improves(&v[0], &[3, 5, 27, 29, 31], 8));
        assert!(!set.improves(&v[0], &[3, 5, 27, 29, 31], 9));
    }

    #[test]
    fn test_high_low_violation() {
        let rules = LineConstraints {
            low_band: Some(Band::new(2, 4)),
            ..LineConstraints::none()
        };
        let set = ConstraintSet::new(&rules, pool());
        let line = [30, 31, 40, 41, 48, 49];
        let v = set.violations(&line);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].kind, ConstraintKind::HighLow);
        assert_eq!(v[0].excess, Excess::TooFew);
        // every member is high, so all of them are candidates for eviction
        assert_eq!(set.offenders(&v[0], &line), line.to_vec());
    }

    #[test]
    fn test_sum_violation() {
        let rules = LineConstraints {
            sum_range: Some((100, 200)),
            ..LineConstraints::none()
        };
        let set = ConstraintSet::new(&rules, pool());
        let line = [1, 2, 3, 4, 5, 40];
        let v = set.violations(&line);
        assert_eq!(v[0].kind, ConstraintKind::SumRange);
        assert_eq!(v[0].excess, Excess::TooFew);
        assert_eq!(v[0].deficit, 45);
        assert!(!set.offenders(&v[0], &line).contains(&40));
        assert!(set.improves(&v[0], &[2, 3, 4, 5, 40], 45));
    }

    #[test]
    fn test_consecutive_violation() {
        let rules = LineConstraints {
            max_consecutive: Some(2),
            ..LineConstraints::none()
        };
        let set = ConstraintSet::new(&rules, pool());
        let line = [10, 11, 12, 13, 30, 40];
        let v = set.violations(&line);
        assert_eq!(v[0].kind, ConstraintKind::MaxConsecutive);
        assert_eq!(v[0].deficit, 2);
        assert_eq!(set.offenders(&v[0], &line), vec![10, 11, 12, 13]);
        assert!(set.improves(&v[0], &[10, 12, 13, 30, 40], 20));
        assert!(!set.improves(&v[0], &[10, 12, 13, 30, 40], 11));
    }

    #[test]
    fn test_unconfigured_constraints_never_fire() {
        let rules = LineConstraints::none();
        let set = ConstraintSet::new(&rules, pool());
        assert!(set.violations(&[1, 2, 3, 4, 5, 6]).is_empty());
        assert_eq!(set.deficit(ConstraintKind::SumRange, &[1, 2, 3, 4, 5, 6]), 0);
    }
}
