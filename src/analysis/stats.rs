//! Windowed statistics shared by both estimators.
//!
//! Every rolling statistic in the crate goes through these helpers so the
//! pitch and formant histories have identical semantics:
//!
//! * the mean of an empty window is `None`, so callers must branch on it;
//! * the standard deviation is the **population** form and is defined as
//!   `0.0` for fewer than two values.

/// Mean and population standard deviation of one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowedStat {
    pub mean: f64,
    pub stddev: f64,
}

impl WindowedStat {
    /// Compute over `values`; `None` when the window is empty.
    pub fn of(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        Some(Self {
            mean,
            stddev: population_stddev(values),
        })
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation; `0.0` for fewer than two values.
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Coefficient of variation in percent, or `100.0` when the mean is not
/// positive.
pub fn coefficient_of_variation(stddev: f64, mean: f64) -> f64 {
    if mean > 0.0 {
        stddev / mean * 100.0
    } else {
        100.0
    }
}
