//! End-to-end scenarios over hand-built oscillator and price series.

use chrono::{Duration, NaiveDate};
use volwave_core::domain::{Bar, PeakKind, PriceMovement};
use volwave_core::indicators::OscillatorSeries;
use volwave_core::peaks::{movement_after, PeakDetector};
use volwave_core::spectral::{
    select_components, ComponentSelection, SpectralAnalyzer, WarmupPolicy,
};
use volwave_core::{run_analysis, AnalysisConfig, AnalysisError, PhaseLabel, TradingSignal};

fn bars_from(closes: &[f64], volumes: &[f64]) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2023, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| Bar {
            timestamp: base + Duration::hours(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
        })
        .collect()
}

const EMBEDDED: [f64; 12] = [0.0, 0.0, 0.0, 5.0, -5.0, 5.0, -5.0, 5.0, -5.0, 0.0, 0.0, 0.0];

#[test]
fn embedded_alternation_is_the_dominant_component() {
    let analysis = SpectralAnalyzer::new(ComponentSelection::Percentile { percentile: 90.0 })
        .analyze_samples(&EMBEDDED)
        .unwrap();

    // Nyquist bin (k = 6, frequency -0.5) carries |X| = 30; bins 5 and 7
    // sit exactly on the 90th-percentile threshold and are not kept
    assert_eq!(analysis.selected(), &[6]);
    assert!((analysis.amplitude_threshold().unwrap() - 19.318_516_525_781_366).abs() < 1e-9);
    let dominant = analysis.dominant().unwrap();
    assert_eq!(dominant.index, 6);
    assert!((dominant.frequency.abs() - 0.5).abs() < 1e-12);
    assert!((dominant.amplitude - 30.0).abs() < 1e-9);
    for component in analysis.components() {
        assert!(component.amplitude > 19.0, "{component:?}");
    }

    // a lone Nyquist bin rebuilds as a constant-amplitude alternation over
    // the whole window, flat segments included: X[6] / 12 = -2.5
    let rebuilt = analysis.reconstructed();
    for (i, value) in rebuilt.iter().enumerate() {
        let expected = if i % 2 == 0 { -2.5 } else { 2.5 };
        assert!((value - expected).abs() < 1e-9, "index {i}: {value}");
    }
    for i in 3..=8 {
        assert_eq!(rebuilt[i].signum(), EMBEDDED[i].signum(), "index {i}");
    }
}

#[test]
fn embedded_alternation_peaks() {
    let closes = [20.0; 12];
    let bars = bars_from(&closes, &[1.0; 12]);
    let values = EMBEDDED.iter().map(|&v| Some(v)).collect();
    let series = OscillatorSeries::from_values(&bars, values).unwrap();
    let events = PeakDetector::new(1).unwrap().detect(&series, &closes).unwrap();

    let summary: Vec<(usize, PeakKind)> = events.iter().map(|e| (e.index, e.kind)).collect();
    assert_eq!(
        summary,
        vec![
            (3, PeakKind::Top),
            (4, PeakKind::Bottom),
            (5, PeakKind::Top),
            (6, PeakKind::Bottom),
            (7, PeakKind::Top),
            (8, PeakKind::Bottom),
        ]
    );
    // flat closes: tops read Up, bottoms read Down
    for e in &events {
        let expected = match e.kind {
            PeakKind::Top => PriceMovement::Up,
            PeakKind::Bottom => PriceMovement::Down,
        };
        assert_eq!(e.movement, Some(expected));
    }
}

#[test]
fn amplitude_threshold_scenario() {
    let (selected, threshold) = select_components(
        &[1.0, 1.0, 1.0, 1.0, 10.0],
        &ComponentSelection::Percentile { percentile: 90.0 },
    );
    assert_eq!(selected, vec![4]);
    let threshold = threshold.unwrap();
    assert!(threshold > 1.0 && threshold < 10.0);
}

#[test]
fn bottom_movement_determinism() {
    assert_eq!(
        movement_after(PeakKind::Bottom, &[9.0, 10.0, 12.0], 1),
        Some(PriceMovement::Up)
    );
    assert_eq!(
        movement_after(PeakKind::Bottom, &[9.0, 10.0, 8.0], 1),
        Some(PriceMovement::Down)
    );
    assert_eq!(
        movement_after(PeakKind::Bottom, &[9.0, 10.0, 10.0], 1),
        Some(PriceMovement::Down)
    );
}

#[test]
fn peak_on_last_bar_has_no_movement() {
    // the last sample is never a candidate, so the latest possible peak
    // still has a following bar
    let closes = [1.0, 2.0, 3.0, 4.0];
    let bars = bars_from(&closes, &[1.0; 4]);
    let series =
        OscillatorSeries::from_values(&bars, vec![Some(0.0), Some(0.0), Some(3.0), Some(1.0)])
            .unwrap();
    let events = PeakDetector::new(1).unwrap().detect(&series, &closes).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].movement, Some(PriceMovement::Up));
    assert_eq!(movement_after(PeakKind::Top, &closes, 3), None);
}

fn trending_bars(n: usize) -> Vec<Bar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| 60.0 + i as f64 * 0.05 + (i as f64 * 0.2).sin() * 2.0)
        .collect();
    let volumes: Vec<f64> = (0..n)
        .map(|i| 10_000.0 + 3_000.0 * (i as f64 * 2.0 * std::f64::consts::PI / 24.0).sin())
        .collect();
    bars_from(&closes, &volumes)
}

#[test]
fn full_run_with_default_config() {
    let bars = trending_bars(600);
    let report = run_analysis(&bars, &AnalysisConfig::default()).unwrap();

    assert_eq!(report.records.len(), 600);
    // slow window 200: no phase before index 199
    assert!(report.records[..199].iter().all(|r| r.phase == PhaseLabel::Unknown));
    // trend window 20: no signal before index 19
    assert!(report.records[..19].iter().all(|r| r.signal == TradingSignal::None));
    assert!(report.signal_threshold >= 0.0);
    assert!(report.amplitude_threshold.is_some());

    let tops: Vec<usize> = report
        .peaks
        .iter()
        .filter(|p| p.kind == PeakKind::Top)
        .map(|p| p.index)
        .collect();
    assert!(tops.windows(2).all(|w| w[1] - w[0] >= 10));
}

#[test]
fn defined_only_warmup_leaves_warmup_bars_unfiltered() {
    let bars = trending_bars(300);
    let mut config = AnalysisConfig::default();
    config.spectral.warmup = WarmupPolicy::DefinedOnly;
    let report = run_analysis(&bars, &config).unwrap();

    // long volume window 28: the oscillator starts at index 27
    for record in &report.records[..27] {
        assert_eq!(record.oscillator, None);
        assert_eq!(record.reconstructed, None);
        assert_eq!(record.signal, TradingSignal::None);
    }
    assert!(report.records[27..].iter().all(|r| r.reconstructed.is_some()));

    let zero_filled = run_analysis(&bars, &AnalysisConfig::default()).unwrap();
    assert!(zero_filled.records.iter().all(|r| r.reconstructed.is_some()));
}

#[test]
fn literal_rule_never_emits_accumulation() {
    let bars = trending_bars(600);
    let report = run_analysis(&bars, &AnalysisConfig::default()).unwrap();
    assert_eq!(report.summary.phases.accumulation, 0);
}

#[test]
fn empty_series_is_insufficient() {
    let err = run_analysis(&[], &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientData { available: 0, .. }));
}
