//! Bar loading for the runner.
//!
//! Two sources:
//! 1. CSV file with header `timestamp,open,high,low,close,volume`
//! 2. Deterministic synthetic bars (tagged), for demos and tests
//!
//! Timestamps must be strictly ascending. Bars failing the OHLC sanity
//! check are kept but logged.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use volwave_core::Bar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognised timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },

    #[error("row {row}: timestamp {timestamp} is not after the previous bar")]
    NotAscending { row: usize, timestamp: NaiveDateTime },

    #[error("no bars in {0}")]
    Empty(String),
}

/// Provenance of a loaded series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv(PathBuf),
    Synthetic,
}

/// Bars for one symbol, with provenance and a content hash.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
    /// BLAKE3 over all bar fields.
    pub dataset_hash: String,
}

impl LoadedData {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>, source: DataSource) -> Self {
        let dataset_hash = dataset_hash(&bars);
        Self {
            symbol: symbol.into(),
            bars,
            source,
            dataset_hash,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load a CSV file for `symbol`.
pub fn load_csv(symbol: &str, path: &Path) -> Result<LoadedData, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_bars(file)?;
    if bars.is_empty() {
        return Err(LoadError::Empty(path.display().to_string()));
    }
    info!(symbol, path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(LoadedData::new(symbol, bars, DataSource::Csv(path.to_path_buf())))
}

/// Parse bars from any CSV reader.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars: Vec<Bar> = Vec::new();

    for (i, record) in csv_reader.deserialize::<CsvBar>().enumerate() {
        // header is line 1
        let row = i + 2;
        let raw = record?;
        let timestamp = parse_timestamp(&raw.timestamp).ok_or_else(|| LoadError::BadTimestamp {
            row,
            value: raw.timestamp.clone(),
        })?;
        if let Some(prev) = bars.last() {
            if timestamp <= prev.timestamp {
                return Err(LoadError::NotAscending { row, timestamp });
            }
        }

        let bar = Bar {
            timestamp,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        };
        if !bar.is_sane() {
            warn!(row, %timestamp, "bar fails OHLC sanity check");
        }
        bars.push(bar);
    }

    Ok(bars)
}

/// Accepts RFC 3339 (offset dropped after conversion to UTC),
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, or a bare date (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// BLAKE3 over every field of every bar, hex encoded.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.and_utc().timestamp().to_le_bytes());
        for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate `count` synthetic hourly bars for `symbol`.
///
/// Seeded from the symbol name, so the same symbol always yields the same
/// series. Volume carries a 24-bar cycle plus noise; closes follow a
/// random walk.
pub fn generate_synthetic_bars(symbol: &str, count: usize, start: NaiveDateTime) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed_bytes = blake3::hash(symbol.as_bytes());
    let mut rng = StdRng::from_seed(*seed_bytes.as_bytes());

    let mut bars = Vec::with_capacity(count);
    let mut price = 75.0_f64;
    for i in 0..count {
        let step_return: f64 = rng.gen_range(-0.004..0.004);
        let open = price;
        let close = price * (1.0 + step_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.002));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.002));
        let cycle = (i as f64 * 2.0 * std::f64::consts::PI / 24.0).sin();
        let volume = (20_000.0 + 8_000.0 * cycle + rng.gen_range(-2_000.0..2_000.0)).round();

        bars.push(Bar {
            timestamp: start + Duration::hours(i as i64),
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
    }
    bars
}

/// Synthetic series wrapped as loaded data.
pub fn load_synthetic(symbol: &str, count: usize) -> LoadedData {
    warn!(symbol, count, "generating synthetic data; results will be tagged as synthetic");
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    LoadedData::new(symbol, generate_synthetic_bars(symbol, count, start), DataSource::Synthetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
timestamp,open,high,low,close,volume
2024-01-02 09:00:00,72.0,72.5,71.8,72.3,1200
2024-01-02 10:00:00,72.3,72.9,72.1,72.8,1500
2024-01-02 11:00:00,72.8,73.0,72.2,72.4,900
";

    #[test]
    fn reads_sample_csv() {
        let bars = read_bars(SAMPLE.as_bytes()).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[1].close, 72.8);
        assert_eq!(bars[2].volume, 900.0);
        assert_eq!(bars[0].timestamp, parse_timestamp("2024-01-02 09:00:00").unwrap());
    }

    #[test]
    fn rejects_out_of_order_rows() {
        let csv = "\
timestamp,open,high,low,close,volume
2024-01-02,1,1,1,1,1
2024-01-01,1,1,1,1,1
";
        let err = read_bars(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::NotAscending { row: 3, .. }));
    }

    #[test]
    fn rejects_bad_timestamp() {
        let csv = "timestamp,open,high,low,close,volume\nyesterday,1,1,1,1,1\n";
        let err = read_bars(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::BadTimestamp { row: 2, .. }));
    }

    #[test]
    fn rejects_non_numeric_fields() {
        let csv = "timestamp,open,high,low,close,volume\n2024-01-02,1,1,1,abc,1\n";
        assert!(matches!(read_bars(csv.as_bytes()).unwrap_err(), LoadError::Csv(_)));
    }

    #[test]
    fn timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-04 15:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-04T15:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-04T15:30:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-04T16:30:00+01:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-04"),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("03/04/2024"), None);
    }

    #[test]
    fn synthetic_is_deterministic_per_symbol() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let a = generate_synthetic_bars("CL=F", 100, start);
        let b = generate_synthetic_bars("CL=F", 100, start);
        let c = generate_synthetic_bars("NG=F", 100, start);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|bar| bar.is_sane()));
        assert!(a.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn dataset_hash_tracks_content() {
        let data = load_synthetic("SPY", 50);
        assert!(data.is_synthetic());
        assert_eq!(data.dataset_hash, dataset_hash(&data.bars));

        let mut changed = data.bars.clone();
        changed[10].volume += 1.0;
        assert_ne!(dataset_hash(&changed), data.dataset_hash);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_csv("SPY", Path::new("/nonexistent/volwave/bars.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
