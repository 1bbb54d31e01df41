//! Volwave Runner — data loading, run orchestration and artifact export.
//!
//! This crate builds on `volwave-core` to provide:
//! - CSV bar loading with strict ordering checks, plus tagged synthetic data
//! - TOML run configuration layered over the core analysis defaults
//! - Single and parallel batch runs with deterministic run ids
//! - Per-bar signals CSV and run summary JSON

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{ConfigError, RunConfig, RunSection};
pub use data_loader::{load_csv, load_synthetic, DataSource, LoadError, LoadedData};
pub use export::{save_artifacts, write_bars_csv, write_signals_csv};
pub use runner::{
    run_batch, run_from_config, run_from_data, BatchOutcome, RunError, RunManifest, RunResult,
};
