//! Pipeline orchestration.
//!
//! raw bars -> oscillator -> {spectral filter, peak detector} -> signals,
//! with phase labels computed independently from the close averages.
//! Each stage is a pure function of its inputs; a run builds new
//! sequences and never mutates the bars.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use crate::config::AnalysisConfig;
use crate::domain::bar::closes;
use crate::domain::{Bar, PeakKind, PhaseLabel, PriceMovement, TradingSignal};
use crate::error::AnalysisError;
use crate::indicators::{Indicator, Sma, VolumeOscillator};
use crate::peaks::{PeakDetector, PeakEvent};
use crate::phase::PhaseClassifier;
use crate::signal::SignalGenerator;
use crate::spectral::{FrequencyComponent, SpectralAnalyzer};
use crate::summary::AnalysisSummary;

/// Peak marker attached to a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakMarker {
    pub kind: PeakKind,
    pub movement: Option<PriceMovement>,
}

/// Augmented per-bar record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarAnalysis {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub oscillator: Option<f64>,
    /// `None` for bars left out of the transform.
    pub reconstructed: Option<f64>,
    pub phase: PhaseLabel,
    pub peak: Option<PeakMarker>,
    pub signal: TradingSignal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub records: Vec<BarAnalysis>,
    pub peaks: Vec<PeakEvent>,
    /// Components used for reconstruction, strongest first.
    pub components: Vec<FrequencyComponent>,
    pub dominant: Option<FrequencyComponent>,
    pub amplitude_threshold: Option<f64>,
    pub signal_threshold: f64,
    pub summary: AnalysisSummary,
}

/// A configured pipeline. Build once, run over any number of series.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: AnalysisConfig,
    oscillator: VolumeOscillator,
    spectral: SpectralAnalyzer,
    phase: PhaseClassifier,
    peaks: PeakDetector,
    trend: Sma,
    signals: SignalGenerator,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            oscillator: VolumeOscillator::new(
                config.oscillator.short_period,
                config.oscillator.long_period,
                config.oscillator.scale,
            )?,
            spectral: SpectralAnalyzer::new(config.spectral.selection)
                .with_warmup(config.spectral.warmup),
            phase: PhaseClassifier::new(
                config.phase.fast_window,
                config.phase.slow_window,
                config.phase.rule,
            )?,
            peaks: PeakDetector::new(config.peaks.min_separation)?,
            trend: Sma::close(config.signal.trend_window),
            signals: SignalGenerator::new(config.signal.threshold),
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn run(&self, bars: &[Bar]) -> Result<AnalysisReport, AnalysisError> {
        let _span = info_span!("analysis", bars = bars.len()).entered();

        let required = self.config.min_bars().max(1);
        if bars.len() < required {
            return Err(AnalysisError::InsufficientData {
                required,
                available: bars.len(),
            });
        }

        let oscillator = self.oscillator.build(bars);
        debug!(
            indicator = self.oscillator.name(),
            defined = oscillator.defined_count(),
            "oscillator built"
        );

        let spectral = self.spectral.analyze(&oscillator)?;
        let close = closes(bars);
        let peaks = self.peaks.detect(&oscillator, &close)?;
        let trend = self.trend.compute(bars);
        let generated = self.signals.generate(spectral.aligned(), &close, &trend)?;
        let phases = self.phase.classify_bars(bars);

        let mut markers: Vec<Option<PeakMarker>> = vec![None; bars.len()];
        for event in &peaks {
            markers[event.index] = Some(PeakMarker {
                kind: event.kind,
                movement: event.movement,
            });
        }

        let records: Vec<BarAnalysis> = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| BarAnalysis {
                index: i,
                timestamp: bar.timestamp,
                close: bar.close,
                oscillator: oscillator.get(i),
                reconstructed: spectral.aligned()[i],
                phase: phases[i],
                peak: markers[i],
                signal: generated.signals[i],
            })
            .collect();

        let summary = AnalysisSummary::from_records(&records, &peaks);
        debug!(
            buys = summary.buy_signals,
            sells = summary.sell_signals,
            peaks = peaks.len(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            records,
            peaks,
            components: spectral.components(),
            dominant: spectral.dominant(),
            amplitude_threshold: spectral.amplitude_threshold(),
            signal_threshold: generated.threshold,
            summary,
        })
    }
}

/// Build a pipeline from `config` and run it once.
pub fn run_analysis(bars: &[Bar], config: &AnalysisConfig) -> Result<AnalysisReport, AnalysisError> {
    Pipeline::new(config.clone())?.run(bars)
}
