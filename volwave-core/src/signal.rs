//! SignalGenerator — Buy/Sell/None per bar from the reconstructed
//! spectral signal, gated by close versus a short trend average.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::TradingSignal;
use crate::error::AnalysisError;
use crate::spectral::percentile;

/// How the signal amplitude threshold is derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SignalThreshold {
    /// Percentile of the reconstructed values, floored at zero.
    Percentile { percentile: f64 },
    /// Sign of the reconstruction alone.
    Zero,
}

impl Default for SignalThreshold {
    fn default() -> Self {
        SignalThreshold::Percentile { percentile: 90.0 }
    }
}

impl SignalThreshold {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        match *self {
            SignalThreshold::Percentile { percentile } if !(0.0..=100.0).contains(&percentile) => {
                Err(AnalysisError::InvalidConfig(format!(
                    "signal percentile must be within 0..=100, got {percentile}"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Per-bar signals plus the threshold they were cut at.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSignals {
    pub threshold: f64,
    pub signals: Vec<TradingSignal>,
}

#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    threshold: SignalThreshold,
}

impl SignalGenerator {
    pub fn new(threshold: SignalThreshold) -> Self {
        Self { threshold }
    }

    /// Amplitude threshold over the defined `reconstructed` values.
    ///
    /// A negative percentile is floored at 0 so the Buy band (`> t`) and the
    /// Sell band (`< -t`) stay disjoint.
    pub fn threshold_for(&self, reconstructed: &[Option<f64>]) -> f64 {
        match self.threshold {
            SignalThreshold::Percentile { percentile: p } => {
                let defined: Vec<f64> = reconstructed.iter().flatten().copied().collect();
                percentile(&defined, p).unwrap_or(0.0).max(0.0)
            }
            SignalThreshold::Zero => 0.0,
        }
    }

    /// Label one bar. Comparisons are strict; a missing trend value
    /// yields `None`.
    pub fn classify(&self, value: f64, close: f64, trend: Option<f64>, threshold: f64) -> TradingSignal {
        let Some(trend) = trend else {
            return TradingSignal::None;
        };
        if value > threshold && close > trend {
            TradingSignal::Buy
        } else if value < -threshold && close < trend {
            TradingSignal::Sell
        } else {
            TradingSignal::None
        }
    }

    pub fn generate(
        &self,
        reconstructed: &[Option<f64>],
        closes: &[f64],
        trend: &[Option<f64>],
    ) -> Result<GeneratedSignals, AnalysisError> {
        AnalysisError::check_len("close", reconstructed.len(), closes.len())?;
        AnalysisError::check_len("trend_ma", reconstructed.len(), trend.len())?;

        let threshold = self.threshold_for(reconstructed);
        let signals: Vec<TradingSignal> = reconstructed
            .iter()
            .zip(closes)
            .zip(trend)
            .map(|((&value, &close), &trend)| match value {
                Some(value) => self.classify(value, close, trend, threshold),
                None => TradingSignal::None,
            })
            .collect();

        debug!(
            threshold,
            buys = signals.iter().filter(|s| **s == TradingSignal::Buy).count(),
            sells = signals.iter().filter(|s| **s == TradingSignal::Sell).count(),
            "trading signals generated"
        );

        Ok(GeneratedSignals { threshold, signals })
    }
}
