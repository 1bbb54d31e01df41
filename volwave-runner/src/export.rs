//! Artifact export: per-bar signals CSV, run summary JSON, bar CSV.
//!
//! Layout: `<output_dir>/<symbol>/signals.csv` and `summary.json`.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use volwave_core::{Bar, BarAnalysis};

use crate::runner::{RunManifest, RunResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize)]
struct SignalRow {
    timestamp: String,
    close: f64,
    oscillator: Option<f64>,
    reconstructed: Option<f64>,
    phase: &'static str,
    peak: Option<&'static str>,
    movement: Option<&'static str>,
    signal: &'static str,
}

impl From<&BarAnalysis> for SignalRow {
    fn from(r: &BarAnalysis) -> Self {
        Self {
            timestamp: r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            close: r.close,
            oscillator: r.oscillator,
            reconstructed: r.reconstructed,
            phase: r.phase.as_str(),
            peak: r.peak.map(|p| p.kind.as_str()),
            movement: r.peak.and_then(|p| p.movement).map(|m| m.as_str()),
            signal: r.signal.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BarRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Write the augmented per-bar records. Missing values are empty cells.
pub fn write_signals_csv(path: &Path, records: &[BarAnalysis]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create signals CSV {}", path.display()))?;
    for record in records {
        writer.serialize(SignalRow::from(record))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush signals CSV {}", path.display()))?;
    Ok(())
}

/// Write bars in the format `load_csv` reads.
pub fn write_bars_csv(path: &Path, bars: &[Bar]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create bars CSV {}", path.display()))?;
    for bar in bars {
        writer.serialize(BarRow {
            timestamp: bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary_json(path: &Path, manifest: &RunManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest).context("Failed to serialize run summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write summary {}", path.display()))?;
    Ok(())
}

/// Directory name for a symbol (path separators replaced).
pub fn symbol_dir_name(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

/// Save the full artifact set for a run and return its directory.
pub fn save_artifacts(result: &RunResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(symbol_dir_name(&result.symbol));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create output dir {}", run_dir.display()))?;

    write_signals_csv(&run_dir.join("signals.csv"), &result.report.records)?;
    write_summary_json(&run_dir.join("summary.json"), &result.manifest())?;
    Ok(run_dir)
}
