use serde::Serialize;

use crate::history::DrawHistory;
use super::relative_deviation;

#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub requested_short: usize,
    /// Short window after clamping to the available history.
    pub short_window: usize,
    pub long_window: usize,
    pub short: Vec<f64>,
    pub long: Vec<f64>,
    /// Short deviation minus long deviation.
    pub acceleration: Vec<f64>,
    /// Fraction of the requested short window actually covered by history.
    pub coverage: f64,
}

pub fn analyze_trend(history: &DrawHistory, short_window: usize, long_window: Option<usize>) -> TrendReport {
    let pool = history.pool();
    let available = history.len();

    let effective_short = short_window.min(available);
    let effective_long = long_window.unwrap_or(available).min(available);
    if effective_short < short_window {
        log::warn!(
            "{}: short window of {} draws clamped to the {} available",
            history.lottery(),
            short_window,
            available
        );
    }

    let short = relative_deviation(history.latest(effective_short), pool);
    let long = relative_deviation(history.latest(effective_long), pool);
    let acceleration = short.iter().zip(&long).map(|(s, l)| s - l).collect();

    let coverage = if short_window == 0 {
        0.0
    } else {
        effective_short as f64 / short_window as f64
    };

    TrendReport {
        requested_short: short_window,
        short_window: effective_short,
        long_window: effective_long,
        short,
        long,
        acceleration,
        coverage,
    }
}
