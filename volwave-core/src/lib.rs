//! Volwave Core — volume-oscillator spectral filtering, phase labelling,
//! peak detection and signal generation.
//!
//! This crate is the deterministic, single-pass analysis over an
//! already-loaded bar series:
//! - Domain types (bars, phase/peak/movement/signal labels)
//! - Rolling indicators and the volume oscillator
//! - Spectral decomposition, component selection and masked reconstruction
//! - Stateless market-phase classification
//! - Separated peak/trough detection with next-bar movement labels
//! - Signal generation from the reconstructed oscillator and a trend filter
//!
//! Data loading and artifact output live in `volwave-runner`.

pub mod config;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod peaks;
pub mod phase;
pub mod pipeline;
pub mod signal;
pub mod spectral;
pub mod summary;

pub use config::AnalysisConfig;
pub use domain::{Bar, PeakKind, PhaseLabel, PriceMovement, TradingSignal};
pub use error::AnalysisError;
pub use pipeline::{run_analysis, AnalysisReport, BarAnalysis, PeakMarker, Pipeline};
