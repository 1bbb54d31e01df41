//! Volwave CLI — analyze bar series, batch runs, spectrum inspection and
//! synthetic data.
//!
//! Commands:
//! - `analyze` — run the full pipeline on one CSV (or synthetic) series
//! - `batch` — analyze several CSV files in parallel
//! - `spectrum` — print the strongest oscillator components and the
//!   oscillator/price spectrum cross-correlation
//! - `synthetic` — write a deterministic synthetic bar CSV

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use volwave_core::domain::bar::closes;
use volwave_core::indicators::VolumeOscillator;
use volwave_core::phase::PhaseRule;
use volwave_core::spectral::{
    cross_correlation, ComponentSelection, FrequencyComponent, SpectralAnalyzer, WarmupPolicy,
};
use volwave_core::{AnalysisConfig, PhaseLabel};
use volwave_runner::data_loader::generate_synthetic_bars;
use volwave_runner::{
    load_csv, load_synthetic, run_batch, run_from_data, save_artifacts, write_bars_csv,
    LoadedData, RunConfig, RunResult,
};

#[derive(Parser)]
#[command(
    name = "volwave",
    about = "Volwave CLI — volume-oscillator spectral analysis and signals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis on one series and save signals.csv + summary.json.
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        overrides: AnalysisOverrides,

        /// Output directory. Overrides the config file's `output_dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Analyze several CSV files in parallel; the symbol is each file's stem.
    Batch {
        /// CSV files with `timestamp,open,high,low,close,volume`.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// TOML config; only its `[analysis]` table is read.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: AnalysisOverrides,

        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Print the strongest oscillator components and the oscillator/price
    /// spectrum cross-correlation.
    Spectrum {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        overrides: AnalysisOverrides,

        /// Number of positive-frequency components to list.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Write deterministic synthetic bars to a CSV file.
    Synthetic {
        /// Symbol; seeds the generator.
        #[arg(long, default_value = "SYNTH")]
        symbol: String,

        #[arg(long, default_value_t = 1000)]
        bars: usize,

        /// Destination CSV path.
        #[arg(long)]
        output: PathBuf,
    },
}

/// Where the bars come from: a config file, a CSV, or synthetic data.
#[derive(Args)]
struct SourceArgs {
    /// Path to a TOML run config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV input file. Overrides the config file's `input`.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Symbol label. Defaults to the input file stem.
    #[arg(long)]
    symbol: Option<String>,

    /// Generate this many synthetic bars instead of reading a file.
    #[arg(long)]
    synthetic: Option<usize>,
}

/// Flags layered over file/default analysis settings.
#[derive(Args)]
struct AnalysisOverrides {
    /// Short volume moving-average window.
    #[arg(long)]
    short: Option<usize>,

    /// Long volume moving-average window.
    #[arg(long)]
    long: Option<usize>,

    /// Amplitude percentile for component selection.
    #[arg(long)]
    percentile: Option<f64>,

    /// Keep only the K strongest components instead of a percentile cut.
    #[arg(long, conflicts_with = "percentile")]
    top_k: Option<usize>,

    /// Minimum index distance between peaks of the same kind.
    #[arg(long)]
    min_separation: Option<usize>,

    /// Close-price trend filter window.
    #[arg(long)]
    trend_window: Option<usize>,

    /// Transform only bars with a defined oscillator value.
    #[arg(long, default_value_t = false)]
    defined_only: bool,

    /// Label `fast < close < slow` in a downtrend as Accumulation.
    #[arg(long, default_value_t = false)]
    reversed_accumulation: bool,
}

impl AnalysisOverrides {
    fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(short) = self.short {
            config.oscillator.short_period = short;
        }
        if let Some(long) = self.long {
            config.oscillator.long_period = long;
        }
        if let Some(percentile) = self.percentile {
            config.spectral.selection = ComponentSelection::Percentile { percentile };
        }
        if let Some(k) = self.top_k {
            config.spectral.selection = ComponentSelection::TopK { k };
        }
        if let Some(distance) = self.min_separation {
            config.peaks.min_separation = distance;
        }
        if let Some(window) = self.trend_window {
            config.signal.trend_window = window;
        }
        if self.defined_only {
            config.spectral.warmup = WarmupPolicy::DefinedOnly;
        }
        if self.reversed_accumulation {
            config.phase.rule = PhaseRule::ReversedAccumulation;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            source,
            overrides,
            output_dir,
        } => run_analyze_cmd(&source, &overrides, output_dir),
        Commands::Batch {
            inputs,
            config,
            overrides,
            output_dir,
        } => run_batch_cmd(&inputs, config.as_deref(), &overrides, &output_dir),
        Commands::Spectrum {
            source,
            overrides,
            top,
        } => run_spectrum_cmd(&source, &overrides, top),
        Commands::Synthetic {
            symbol,
            bars,
            output,
        } => run_synthetic_cmd(&symbol, bars, &output),
    }
}

/// Resolve the data source and analysis config for a single-series command.
fn resolve_source(
    source: &SourceArgs,
    overrides: &AnalysisOverrides,
) -> Result<(LoadedData, AnalysisConfig, Option<PathBuf>)> {
    if source.input.is_some() && source.synthetic.is_some() {
        bail!("--input and --synthetic are mutually exclusive");
    }

    let file = source
        .config
        .as_deref()
        .map(RunConfig::from_file)
        .transpose()?;

    let (mut config, file_output, file_symbol, file_input, file_synthetic) = match file {
        Some(rc) => (
            rc.analysis,
            Some(rc.run.output_dir),
            Some(rc.run.symbol),
            rc.run.input,
            rc.run.synthetic_bars,
        ),
        None => (AnalysisConfig::default(), None, None, None, None),
    };
    overrides.apply(&mut config);
    config.validate()?;

    let input = source.input.clone().or(if source.synthetic.is_some() {
        None
    } else {
        file_input
    });
    let synthetic = source.synthetic.or(file_synthetic);

    let data = match (input, synthetic) {
        (Some(path), _) => {
            let symbol = source
                .symbol
                .clone()
                .or(file_symbol)
                .unwrap_or_else(|| volwave_runner::runner::symbol_from_path(&path));
            load_csv(&symbol, &path)?
        }
        (None, Some(count)) => {
            let symbol = source
                .symbol
                .clone()
                .or(file_symbol)
                .unwrap_or_else(|| "SYNTH".to_string());
            load_synthetic(&symbol, count)
        }
        (None, None) => bail!("one of --input, --synthetic or --config is required"),
    };

    Ok((data, config, file_output))
}

fn run_analyze_cmd(
    source: &SourceArgs,
    overrides: &AnalysisOverrides,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let (data, config, file_output) = resolve_source(source, overrides)?;
    let result = run_from_data(&data, &config)?;

    print_summary(&result);

    let output_dir = output_dir
        .or(file_output)
        .unwrap_or_else(|| PathBuf::from("results"));
    let run_dir = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn run_batch_cmd(
    inputs: &[PathBuf],
    config_path: Option<&Path>,
    overrides: &AnalysisOverrides,
    output_dir: &Path,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => RunConfig::analysis_from_file(path)?,
        None => AnalysisConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;

    let outcomes = run_batch(inputs, &config)?;

    println!();
    println!("{:<12} {:>7} {:>6} {:>6} {:>6}  Status", "Symbol", "Bars", "Buys", "Sells", "Peaks");
    println!("{}", "-".repeat(60));
    let mut failures = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(result) => {
                let run_dir = save_artifacts(result, output_dir)?;
                let summary = &result.report.summary;
                println!(
                    "{:<12} {:>7} {:>6} {:>6} {:>6}  {}",
                    result.symbol,
                    summary.bars,
                    summary.buy_signals,
                    summary.sell_signals,
                    result.report.peaks.len(),
                    run_dir.display()
                );
            }
            Err(e) => {
                failures += 1;
                println!("{:<12} {:>7} {:>6} {:>6} {:>6}  FAILED: {e}", outcome.input.display(), "-", "-", "-", "-");
            }
        }
    }
    println!();

    if failures == outcomes.len() {
        bail!("all {failures} input(s) failed");
    }
    if failures > 0 {
        info!(failures, total = outcomes.len(), "batch finished with failures");
    }
    Ok(())
}

fn run_spectrum_cmd(source: &SourceArgs, overrides: &AnalysisOverrides, top: usize) -> Result<()> {
    let (data, config, _) = resolve_source(source, overrides)?;
    let osc = &config.oscillator;
    let oscillator =
        VolumeOscillator::new(osc.short_period, osc.long_period, osc.scale)?.build(&data.bars);
    let analysis = SpectralAnalyzer::new(config.spectral.selection)
        .with_warmup(config.spectral.warmup)
        .analyze(&oscillator)?;
    let decomposition = analysis.decomposition();
    let correlation = cross_correlation(&oscillator, &closes(&data.bars))?;

    // Real input: the negative half mirrors the positive half.
    let mut positive: Vec<FrequencyComponent> = (0..decomposition.len())
        .filter_map(|i| decomposition.component(i))
        .filter(|c| c.frequency > 0.0)
        .collect();
    positive.sort_by(|a, b| b.amplitude.total_cmp(&a.amplitude).then(a.index.cmp(&b.index)));

    println!();
    println!("=== Spectrum: {} ({} bars) ===", data.symbol, data.bars.len());
    if let Some(dominant) = decomposition.dominant() {
        println!("Dominant:       {}", describe(&dominant));
    }
    println!("Selected:       {} component(s)", analysis.selected().len());
    if let Some(peak) = correlation.strongest() {
        println!(
            "Osc/price xcorr: strongest at lag {} bins (|c| = {:.3}, {} lags)",
            peak.lag,
            peak.magnitude,
            correlation.len()
        );
    }
    println!();
    println!("{:>6} {:>12} {:>10} {:>14}", "Index", "Frequency", "Period", "Amplitude");
    println!("{}", "-".repeat(45));
    for c in positive.iter().take(top) {
        println!(
            "{:>6} {:>12.6} {:>10} {:>14.3}",
            c.index,
            c.frequency,
            c.period.map_or_else(|| "-".to_string(), |p| format!("{p:.2}")),
            c.amplitude
        );
    }
    println!();
    Ok(())
}

fn run_synthetic_cmd(symbol: &str, count: usize, output: &Path) -> Result<()> {
    if count == 0 {
        bail!("--bars must be at least 1");
    }
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid synthetic start date")?;
    let bars = generate_synthetic_bars(symbol, count, start);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    write_bars_csv(output, &bars)?;
    println!("Wrote {count} synthetic bars for {symbol} to {}", output.display());
    Ok(())
}

fn describe(c: &FrequencyComponent) -> String {
    match c.period {
        Some(period) => format!(
            "bin {} (f = {:.6}, period {:.2} bars, amplitude {:.3})",
            c.index, c.frequency, period, c.amplitude
        ),
        None => format!("bin {} (DC, amplitude {:.3})", c.index, c.amplitude),
    }
}

fn print_summary(result: &RunResult) {
    let report = &result.report;
    let summary = &report.summary;

    println!();
    println!("=== Analysis Result ===");
    println!("Symbol:         {}", result.symbol);
    println!("Run id:         {}", &result.run_id[..12.min(result.run_id.len())]);
    println!(
        "Bars:           {} ({} with oscillator)",
        summary.bars, summary.oscillator_defined
    );
    if let Some(dominant) = &report.dominant {
        println!("Dominant:       {}", describe(dominant));
    }
    println!("Components:     {}", report.components.len());
    if let Some(threshold) = report.amplitude_threshold {
        println!("Amp threshold:  {threshold:.3}");
    }
    println!("Sig threshold:  {:.4}", report.signal_threshold);
    println!();
    println!("--- Signals ---");
    println!("Buy:            {}", summary.buy_signals);
    println!("Sell:           {}", summary.sell_signals);
    println!();
    println!("--- Phases ---");
    for label in PhaseLabel::ALL {
        println!("{:<15} {}", format!("{label}:"), summary.phases.get(label));
    }
    println!();
    println!("--- Peaks ---");
    println!(
        "Tops:           {} (down {}, up {}, none {})",
        summary.tops.count, summary.tops.down, summary.tops.up, summary.tops.no_movement
    );
    println!(
        "Bottoms:        {} (up {}, down {}, none {})",
        summary.bottoms.count, summary.bottoms.up, summary.bottoms.down, summary.bottoms.no_movement
    );
    if let Some(rate) = summary.reversal_rate() {
        println!("Reversal rate:  {:.1}%", rate * 100.0);
    }
    if result.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
