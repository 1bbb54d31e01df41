//! Rolling indicators over the bar sequence.
//!
//! Indicators are pure functions: bar history in, a per-bar series out.
//! Bars without enough history get `None`, never a substituted zero.

pub mod sma;
pub mod volume_oscillator;

pub use sma::{rolling_mean, PriceField, Sma};
pub use volume_oscillator::{OscillatorScale, OscillatorSeries, VolumeOscillator};

use crate::domain::Bar;

/// Trait for indicators.
///
/// Output has the same length as the input. The first `lookback()` values
/// are `None` (warmup).
///
/// # Look-ahead guard
/// No value at bar t may depend on data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_close_20", "vol_osc_14_28").
    fn name(&self) -> &str;

    /// Number of bars before the indicator produces a value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>>;
}

/// Create synthetic bars from (close, volume) pairs for testing.
///
/// Timestamps are hourly from 2024-01-02 09:00; open = previous close,
/// high/low bracket open and close by 0.5.
#[cfg(test)]
pub fn make_bars(closes: &[f64], volumes: &[f64]) -> Vec<Bar> {
    assert_eq!(closes.len(), volumes.len());
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-9;
