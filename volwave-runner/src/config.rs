//! Run configuration file.
//!
//! ```toml
//! [run]
//! symbol = "CL=F"
//! input = "data/cl_f_1h.csv"
//! output_dir = "results"
//!
//! [analysis.oscillator]
//! short_period = 14
//! long_period = 28
//!
//! [analysis.spectral.selection]
//! mode = "percentile"
//! percentile = 90.0
//! ```
//!
//! Every `[analysis]` field is optional and falls back to the core defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use volwave_core::{AnalysisConfig, AnalysisError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid analysis settings: {0}")]
    Invalid(#[from] AnalysisError),

    #[error("config has neither an input file nor synthetic_bars")]
    MissingInput,
}

/// Where the bars for a run come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSection {
    pub symbol: String,
    /// CSV file with `timestamp,open,high,low,close,volume`.
    #[serde(default)]
    pub input: Option<PathBuf>,
    /// Generate this many synthetic bars instead of reading `input`.
    #[serde(default)]
    pub synthetic_bars: Option<usize>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub run: RunSection,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// A config file read for its `[analysis]` table alone.
#[derive(Debug, Deserialize)]
struct AnalysisOnly {
    #[serde(default)]
    analysis: AnalysisConfig,
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl RunConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&read_config(path)?)
    }

    /// Load only the analysis settings of a config file. A `[run]` table
    /// may be missing or incomplete; used where inputs come from elsewhere.
    pub fn analysis_from_file(path: &Path) -> Result<AnalysisConfig, ConfigError> {
        Self::analysis_from_toml(&read_config(path)?)
    }

    pub fn analysis_from_toml(content: &str) -> Result<AnalysisConfig, ConfigError> {
        let AnalysisOnly { analysis } = toml::from_str(content)?;
        analysis.validate()?;
        Ok(analysis)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.input.is_none() && self.run.synthetic_bars.is_none() {
            return Err(ConfigError::MissingInput);
        }
        self.analysis.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volwave_core::phase::PhaseRule;
    use volwave_core::signal::SignalThreshold;
    use volwave_core::spectral::ComponentSelection;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = RunConfig::from_toml(
            r#"
            [run]
            symbol = "CL=F"
            input = "data/cl.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.run.symbol, "CL=F");
        assert_eq!(config.run.output_dir, PathBuf::from("results"));
        assert_eq!(config.analysis, AnalysisConfig::default());
    }

    #[test]
    fn nested_analysis_tables_override_defaults() {
        let config = RunConfig::from_toml(
            r#"
            [run]
            symbol = "SPY"
            synthetic_bars = 500

            [analysis.oscillator]
            short_period = 10
            long_period = 50
            scale = "ratio"

            [analysis.spectral.selection]
            mode = "top_k"
            k = 3

            [analysis.phase]
            rule = "reversed_accumulation"

            [analysis.signal.threshold]
            mode = "zero"
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.oscillator.long_period, 50);
        assert_eq!(config.analysis.spectral.selection, ComponentSelection::TopK { k: 3 });
        assert_eq!(config.analysis.phase.rule, PhaseRule::ReversedAccumulation);
        assert_eq!(config.analysis.phase.slow_window, 200);
        assert_eq!(config.analysis.signal.threshold, SignalThreshold::Zero);
        assert_eq!(config.analysis.signal.trend_window, 20);
    }

    #[test]
    fn missing_input_is_rejected() {
        let err = RunConfig::from_toml("[run]\nsymbol = \"SPY\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingInput));
    }

    #[test]
    fn invalid_windows_are_rejected() {
        let err = RunConfig::from_toml(
            r#"
            [run]
            symbol = "SPY"
            input = "x.csv"

            [analysis.oscillator]
            short_period = 30
            long_period = 20
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn analysis_only_file_needs_no_run_table() {
        let analysis = RunConfig::analysis_from_toml("[analysis.peaks]\nmin_separation = 5\n").unwrap();
        assert_eq!(analysis.peaks.min_separation, 5);
        assert_eq!(analysis.oscillator.long_period, 28);

        // a [run] table without inputs is ignored rather than rejected
        let analysis = RunConfig::analysis_from_toml(
            "[run]\nsymbol = \"X\"\n\n[analysis.signal]\ntrend_window = 30\n",
        )
        .unwrap();
        assert_eq!(analysis.signal.trend_window, 30);

        assert_eq!(RunConfig::analysis_from_toml("").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn analysis_only_file_is_still_validated() {
        let err = RunConfig::analysis_from_toml("[analysis.peaks]\nmin_separation = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn analysis_from_missing_file_is_io_error() {
        let err = RunConfig::analysis_from_file(Path::new("/nonexistent/volwave.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = RunConfig::from_toml("[run\nsymbol=").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
