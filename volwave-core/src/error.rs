//! Error taxonomy for the analysis pipeline.
//!
//! Only conditions that abort a run are errors. Warmup gaps, unlabelled
//! phases and peaks without a following bar are carried as data
//! (`Option`, `PhaseLabel::Unknown`, `movement: None`).

use thiserror::Error;

/// Fatal errors raised by the pipeline stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("insufficient data: need at least {required} bars, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("series length mismatch for '{series}': expected {expected}, got {actual}")]
    LengthMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl AnalysisError {
    /// Helper for length checks between aligned per-bar series.
    pub(crate) fn check_len(
        series: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<(), AnalysisError> {
        if expected == actual {
            Ok(())
        } else {
            Err(AnalysisError::LengthMismatch {
                series,
                expected,
                actual,
            })
        }
    }
}
