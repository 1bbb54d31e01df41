//! Analysis configuration.
//!
//! Every field has a default, so a partial TOML/JSON table deserializes
//! into a complete config. `validate()` is called by the pipeline before
//! any stage is built.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::indicators::OscillatorScale;
use crate::phase::PhaseRule;
use crate::signal::SignalThreshold;
use crate::spectral::{ComponentSelection, WarmupPolicy};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub oscillator: OscillatorConfig,
    pub spectral: SpectralConfig,
    pub phase: PhaseConfig,
    pub peaks: PeakConfig,
    pub signal: SignalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorConfig {
    pub short_period: usize,
    pub long_period: usize,
    pub scale: OscillatorScale,
}

impl OscillatorConfig {
    /// 14/28 windows, percent scale.
    pub fn classic() -> Self {
        Self {
            short_period: 14,
            long_period: 28,
            scale: OscillatorScale::Percent,
        }
    }

    /// 10/50 windows, percent scale.
    pub fn wide() -> Self {
        Self {
            short_period: 10,
            long_period: 50,
            scale: OscillatorScale::Percent,
        }
    }
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self::classic()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    pub selection: ComponentSelection,
    /// How oscillator warmup bars enter the transform.
    pub warmup: WarmupPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    pub fast_window: usize,
    pub slow_window: usize,
    pub rule: PhaseRule,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            fast_window: 50,
            slow_window: 200,
            rule: PhaseRule::Literal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    pub min_separation: usize,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self { min_separation: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub trend_window: usize,
    pub threshold: SignalThreshold,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            trend_window: 20,
            threshold: SignalThreshold::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let osc = &self.oscillator;
        if osc.short_period == 0 || osc.long_period <= osc.short_period {
            return Err(AnalysisError::InvalidConfig(format!(
                "oscillator windows need 0 < short ({}) < long ({})",
                osc.short_period, osc.long_period
            )));
        }
        self.spectral.selection.validate()?;
        if self.phase.fast_window == 0 || self.phase.slow_window <= self.phase.fast_window {
            return Err(AnalysisError::InvalidConfig(format!(
                "phase windows need 0 < fast ({}) < slow ({})",
                self.phase.fast_window, self.phase.slow_window
            )));
        }
        if self.peaks.min_separation == 0 {
            return Err(AnalysisError::InvalidConfig(
                "peak min_separation must be >= 1".into(),
            ));
        }
        if self.signal.trend_window == 0 {
            return Err(AnalysisError::InvalidConfig(
                "signal trend_window must be >= 1".into(),
            ));
        }
        self.signal.threshold.validate()
    }

    /// Fewest bars a run accepts.
    pub fn min_bars(&self) -> usize {
        self.oscillator.long_period.max(self.signal.trend_window)
    }
}
