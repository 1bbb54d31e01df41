//! Simple Moving Average (SMA).
//!
//! Rolling mean of one bar field over a trailing window.
//! Lookback: period - 1 (first value at index period-1).

use super::Indicator;
use crate::domain::Bar;

/// Bar field an SMA is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Close,
    Volume,
}

impl PriceField {
    fn extract(&self, bar: &Bar) -> f64 {
        match self {
            PriceField::Close => bar.close,
            PriceField::Volume => bar.volume,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            PriceField::Close => "close",
            PriceField::Volume => "volume",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    field: PriceField,
    name: String,
}

impl Sma {
    pub fn new(period: usize, field: PriceField) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            field,
            name: format!("sma_{}_{period}", field.as_str()),
        }
    }

    /// SMA of close prices.
    pub fn close(period: usize) -> Self {
        Self::new(period, PriceField::Close)
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let values: Vec<f64> = bars.iter().map(|b| self.field.extract(b)).collect();
        rolling_mean(&values, self.period)
    }
}

/// Trailing mean over `period` samples.
///
/// A window containing a non-finite sample yields `None`, as do the first
/// `period - 1` positions.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut invalid = 0usize;
    for (i, &entering) in values.iter().enumerate() {
        if entering.is_finite() {
            sum += entering;
        } else {
            invalid += 1;
        }

        if i >= period {
            let leaving = values[i - period];
            if leaving.is_finite() {
                sum -= leaving;
            } else {
                invalid -= 1;
            }
        }

        if i + 1 >= period && invalid == 0 {
            result[i] = Some(sum / period as f64);
        }
    }

    result
}
