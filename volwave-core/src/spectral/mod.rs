//! Spectral filtering of the oscillator.
//!
//! Forward transform, amplitude-based component selection, a single
//! masked inverse transform back to the time domain, and the
//! oscillator/price spectrum cross-correlation.

pub mod analyzer;
pub mod correlation;
pub mod percentile;
pub mod transform;

pub use analyzer::{
    select_components, ComponentSelection, SpectralAnalysis, SpectralAnalyzer, WarmupPolicy,
};
pub use correlation::{correlate, cross_correlation, CorrelationPeak, CrossCorrelation};
pub use percentile::percentile;
pub use transform::{frequency_labels, FrequencyComponent, SpectralDecomposition};
