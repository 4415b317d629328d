//! Classical additive seasonal decomposition.
//!
//! `observed = trend + seasonal + residual`, with the trend estimated by a
//! centered moving average and the seasonal component by averaging the
//! detrended values of each cycle position.

use crate::error::{AnalyticsError, Result};
use crate::series::TimeSeries;
use statrs::statistics::Statistics;
use std::fmt::Debug;
use tracing::debug;

/// Result of an additive decomposition.
///
/// All four arrays have the length of the input. `trend` and `residual` are
/// `None` within `period / 2` samples of either end, where the centered
/// moving average has no full window.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionResult {
    /// Input values
    pub observed: Vec<f64>,
    /// Centered moving average
    pub trend: Vec<Option<f64>>,
    /// Zero-mean cycle tiled over the whole series
    pub seasonal: Vec<f64>,
    /// observed - trend - seasonal
    pub residual: Vec<Option<f64>>,
    /// Cycle length in samples
    pub period: usize,
}

impl DecompositionResult {
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// The first `period` seasonal values: one canonical cycle.
    pub fn seasonal_cycle(&self) -> &[f64] {
        &self.seasonal[..self.period.min(self.seasonal.len())]
    }

    /// Number of samples where the trend is defined.
    pub fn defined_trend_count(&self) -> usize {
        self.trend.iter().filter(|t| t.is_some()).count()
    }
}

/// Centered moving average of window `period`.
///
/// Odd periods use a plain window. Even periods use a `period + 1` window with
/// half weight on both ends, which is the mean of two staggered windows.
fn centered_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let half = period / 2;
    let mut trend = vec![None; n];

    if n < 2 * half + 1 {
        return trend;
    }

    for (i, slot) in trend.iter_mut().enumerate().take(n - half).skip(half) {
        let sum: f64 = if period % 2 == 1 {
            values[i - half..=i + half].iter().sum()
        } else {
            let inner: f64 = values[i - half + 1..i + half].iter().sum();
            inner + 0.5 * (values[i - half] + values[i + half])
        };
        *slot = Some(sum / period as f64);
    }

    trend
}

/// Average detrended values per cycle position and center the result at zero.
fn average_cycle(detrended: &[Option<f64>], period: usize) -> Vec<f64> {
    let mut cycle: Vec<f64> = (0..period)
        .map(|s| {
            let group: Vec<f64> = detrended
                .iter()
                .skip(s)
                .step_by(period)
                .filter_map(|v| *v)
                .collect();
            group.iter().mean()
        })
        .collect();

    let cycle_mean = cycle.iter().mean();
    for c in &mut cycle {
        *c -= cycle_mean;
    }

    cycle
}

/// Additive decomposition of regularly spaced values with cycle length `period`.
///
/// # Arguments
/// * `values` - Observations, oldest first
/// * `period` - Cycle length in samples
///
/// # Errors
/// * `InvalidInput` if `period` is zero or a value is not finite
/// * `InsufficientData` if there are fewer than two full cycles
pub fn seasonal_decompose(values: &[f64], period: usize) -> Result<DecompositionResult> {
    if period == 0 {
        return Err(AnalyticsError::InvalidInput(
            "period must be at least 1".to_string(),
        ));
    }

    let n = values.len();
    if n / 2 < period {
        return Err(AnalyticsError::InsufficientData {
            needed: period.saturating_mul(2),
            got: n,
        });
    }

    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(AnalyticsError::InvalidInput(format!(
            "non-finite value at position {}",
            pos
        )));
    }

    let trend = centered_moving_average(values, period);

    let detrended: Vec<Option<f64>> = values
        .iter()
        .zip(trend.iter())
        .map(|(v, t)| t.map(|t| v - t))
        .collect();

    let cycle = average_cycle(&detrended, period);
    let seasonal: Vec<f64> = (0..n).map(|i| cycle[i % period]).collect();

    let residual: Vec<Option<f64>> = detrended
        .iter()
        .zip(seasonal.iter())
        .map(|(d, s)| d.map(|d| d - s))
        .collect();

    let result = DecompositionResult {
        observed: values.to_vec(),
        trend,
        seasonal,
        residual,
        period,
    };

    debug!(
        n,
        period,
        trend_defined = result.defined_trend_count(),
        "decomposition complete"
    );

    Ok(result)
}

/// Decompose the values of an ordered series.
pub fn decompose_series<K: Ord + Copy + Debug>(
    series: &TimeSeries<K>,
    period: usize,
) -> Result<DecompositionResult> {
    seasonal_decompose(series.values(), period)
}
