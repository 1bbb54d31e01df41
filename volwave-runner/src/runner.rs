//! Run orchestration — wires data loading, the core pipeline and run
//! identity together.
//!
//! Entry points:
//! - `run_from_config()`: resolves the data source from a `RunConfig`. Used by the CLI.
//! - `run_from_data()`: pre-loaded bars, no I/O.
//! - `run_batch()`: many CSV inputs in parallel, one outcome per input.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use volwave_core::spectral::FrequencyComponent;
use volwave_core::summary::AnalysisSummary;
use volwave_core::{AnalysisConfig, AnalysisError, AnalysisReport, Pipeline};

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::{load_csv, load_synthetic, LoadError, LoadedData};
use crate::export::symbol_dir_name;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("failed to fingerprint run: {0}")]
    Fingerprint(#[from] serde_json::Error),
    #[error("symbol '{0}' is shared by several batch inputs; artifacts would collide")]
    DuplicateSymbol(String),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub symbol: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub config: AnalysisConfig,
    pub report: AnalysisReport,
}

/// The persisted summary: everything except the per-bar records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub symbol: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub bar_count: usize,
    pub config: AnalysisConfig,
    pub dominant: Option<FrequencyComponent>,
    pub components: Vec<FrequencyComponent>,
    pub amplitude_threshold: Option<f64>,
    pub signal_threshold: f64,
    pub summary: AnalysisSummary,
    pub reversal_rate: Option<f64>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunResult {
    pub fn manifest(&self) -> RunManifest {
        RunManifest {
            schema_version: SCHEMA_VERSION,
            run_id: self.run_id.clone(),
            symbol: self.symbol.clone(),
            dataset_hash: self.dataset_hash.clone(),
            has_synthetic: self.has_synthetic,
            bar_count: self.report.records.len(),
            config: self.config.clone(),
            dominant: self.report.dominant,
            components: self.report.components.clone(),
            amplitude_threshold: self.report.amplitude_threshold,
            signal_threshold: self.report.signal_threshold,
            summary: self.report.summary.clone(),
            reversal_rate: self.report.summary.reversal_rate(),
        }
    }
}

/// Deterministic run identity: BLAKE3 over symbol, dataset hash and the
/// canonical JSON of the analysis config.
pub fn run_id(symbol: &str, dataset_hash: &str, config: &AnalysisConfig) -> Result<String, serde_json::Error> {
    let config_json = serde_json::to_string(config)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(&[0]);
    hasher.update(dataset_hash.as_bytes());
    hasher.update(&[0]);
    hasher.update(config_json.as_bytes());
    Ok(hasher.finalize().to_hex().to_string())
}

/// Run the pipeline over pre-loaded data. No I/O.
pub fn run_from_data(data: &LoadedData, config: &AnalysisConfig) -> Result<RunResult, RunError> {
    let pipeline = Pipeline::new(config.clone())?;
    run_with_pipeline(&pipeline, data)
}

fn run_with_pipeline(pipeline: &Pipeline, data: &LoadedData) -> Result<RunResult, RunError> {
    let report = pipeline.run(&data.bars)?;
    let id = run_id(&data.symbol, &data.dataset_hash, pipeline.config())?;
    info!(
        symbol = %data.symbol,
        bars = data.bars.len(),
        buys = report.summary.buy_signals,
        sells = report.summary.sell_signals,
        peaks = report.peaks.len(),
        "run complete"
    );
    Ok(RunResult {
        run_id: id,
        symbol: data.symbol.clone(),
        dataset_hash: data.dataset_hash.clone(),
        has_synthetic: data.is_synthetic(),
        config: pipeline.config().clone(),
        report,
    })
}

/// Resolve the data source named by `config` and run it.
pub fn run_from_config(config: &RunConfig) -> Result<RunResult, RunError> {
    let data = match (&config.run.input, config.run.synthetic_bars) {
        (Some(path), _) => load_csv(&config.run.symbol, path)?,
        (None, Some(count)) => load_synthetic(&config.run.symbol, count),
        (None, None) => return Err(ConfigError::MissingInput.into()),
    };
    run_from_data(&data, &config.analysis)
}

/// Outcome of one input in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub input: PathBuf,
    pub result: Result<RunResult, RunError>,
}

/// Symbol for a CSV input: its file stem.
pub fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Analyse several CSV files in parallel. Runs share no state; a failing
/// input is reported in its outcome and does not stop the others.
/// Inputs whose symbols map to the same artifact directory all fail with
/// `DuplicateSymbol`. Outcomes are returned in input order.
pub fn run_batch(inputs: &[PathBuf], config: &AnalysisConfig) -> Result<Vec<BatchOutcome>, RunError> {
    let pipeline = Pipeline::new(config.clone())?;

    let mut dir_counts: HashMap<String, usize> = HashMap::new();
    for input in inputs {
        *dir_counts
            .entry(symbol_dir_name(&symbol_from_path(input)))
            .or_default() += 1;
    }

    let outcomes: Vec<BatchOutcome> = inputs
        .par_iter()
        .map(|input| {
            let symbol = symbol_from_path(input);
            let result = if dir_counts.get(&symbol_dir_name(&symbol)).copied().unwrap_or(0) > 1 {
                Err(RunError::DuplicateSymbol(symbol))
            } else {
                load_csv(&symbol, input)
                    .map_err(RunError::from)
                    .and_then(|data| run_with_pipeline(&pipeline, &data))
            };
            if let Err(e) = &result {
                warn!(input = %input.display(), error = %e, "batch input failed");
            }
            BatchOutcome {
                input: input.clone(),
                result,
            }
        })
        .collect();
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.phase.fast_window = 10;
        config.phase.slow_window = 40;
        config
    }

    #[test]
    fn run_id_is_deterministic_and_config_sensitive() {
        let config = AnalysisConfig::default();
        let a = run_id("SPY", "abc", &config).unwrap();
        let b = run_id("SPY", "abc", &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let mut other = config.clone();
        other.peaks.min_separation = 5;
        assert_ne!(a, run_id("SPY", "abc", &other).unwrap());
        assert_ne!(a, run_id("QQQ", "abc", &config).unwrap());
        assert_ne!(a, run_id("SPY", "abd", &config).unwrap());
    }

    #[test]
    fn synthetic_run_is_tagged() {
        let data = load_synthetic("CL=F", 300);
        let result = run_from_data(&data, &small_config()).unwrap();
        assert!(result.has_synthetic);
        assert_eq!(result.report.records.len(), 300);
        let manifest = result.manifest();
        assert_eq!(manifest.schema_version, SCHEMA_VERSION);
        assert_eq!(manifest.bar_count, 300);
        assert_eq!(manifest.run_id, result.run_id);
    }

    #[test]
    fn synthetic_volume_cycle_is_dominant() {
        let data = load_synthetic("CL=F", 480);
        let result = run_from_data(&data, &small_config()).unwrap();
        let period = result.report.dominant.unwrap().period.unwrap();
        assert!((period - 24.0).abs() < 1.0, "period {period}");
    }

    #[test]
    fn short_series_fails_with_insufficient_data() {
        let data = load_synthetic("CL=F", 10);
        let err = run_from_data(&data, &small_config()).unwrap_err();
        assert!(matches!(
            err,
            RunError::Analysis(AnalysisError::InsufficientData { required: 28, available: 10 })
        ));
    }

    #[test]
    fn symbol_from_file_stem() {
        assert_eq!(symbol_from_path(Path::new("data/CL=F.csv")), "CL=F");
        assert_eq!(symbol_from_path(Path::new("spy")), "spy");
    }
}
