//! Cross-correlation of the oscillator spectrum with the close-price
//! spectrum.
//!
//! Both spectra are taken over the same bars: those with a defined
//! oscillator value. The correlation is the full discrete one,
//! `c[k] = Σ a[n + k] · conj(b[n])` for lags `k` in `-(m - 1)..=(n - 1)`.

use rustfft::num_complex::Complex;
use serde::Serialize;

use super::transform::SpectralDecomposition;
use crate::error::AnalysisError;
use crate::indicators::OscillatorSeries;

/// Full cross-correlation of two coefficient vectors, indexed by lag.
#[derive(Debug, Clone)]
pub struct CrossCorrelation {
    values: Vec<Complex<f64>>,
    /// Lag of `values[0]` is `-offset`.
    offset: usize,
}

/// Strongest lag of a cross-correlation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationPeak {
    pub lag: isize,
    pub magnitude: f64,
}

impl CrossCorrelation {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Lag in bins of entry `i`.
    pub fn lag(&self, i: usize) -> isize {
        i as isize - self.offset as isize
    }

    /// Value at `lag`, if inside the full range.
    pub fn at(&self, lag: isize) -> Option<Complex<f64>> {
        let i = usize::try_from(lag + self.offset as isize).ok()?;
        self.values.get(i).copied()
    }

    /// Largest-magnitude lag; the most negative lag wins ties.
    pub fn strongest(&self) -> Option<CorrelationPeak> {
        let mut best: Option<CorrelationPeak> = None;
        for (i, c) in self.values.iter().enumerate() {
            let magnitude = c.norm();
            match best {
                Some(b) if magnitude <= b.magnitude => {}
                _ => {
                    best = Some(CorrelationPeak {
                        lag: self.lag(i),
                        magnitude,
                    })
                }
            }
        }
        best
    }
}

/// Full correlation of `a` against `b` (conjugating `b`).
pub fn correlate(a: &[Complex<f64>], b: &[Complex<f64>]) -> CrossCorrelation {
    if a.is_empty() || b.is_empty() {
        return CrossCorrelation {
            values: Vec::new(),
            offset: 0,
        };
    }
    let offset = b.len() - 1;
    let values: Vec<Complex<f64>> = (0..a.len() + b.len() - 1)
        .map(|i| {
            let lag = i as isize - offset as isize;
            b.iter()
                .enumerate()
                .filter_map(|(n, bn)| {
                    let j = usize::try_from(n as isize + lag).ok()?;
                    a.get(j).map(|aj| aj * bn.conj())
                })
                .sum::<Complex<f64>>()
        })
        .collect();
    CrossCorrelation { values, offset }
}

/// Correlate the spectrum of the defined oscillator samples with the
/// spectrum of the closes on the same bars.
pub fn cross_correlation(
    oscillator: &OscillatorSeries,
    closes: &[f64],
) -> Result<CrossCorrelation, AnalysisError> {
    AnalysisError::check_len("close", oscillator.len(), closes.len())?;

    let (osc, price): (Vec<f64>, Vec<f64>) = oscillator
        .values()
        .iter()
        .zip(closes)
        .filter_map(|(v, &close)| v.map(|x| (x, close)))
        .unzip();

    let osc_spectrum = SpectralDecomposition::forward(&osc)?;
    let price_spectrum = SpectralDecomposition::forward(&price)?;
    Ok(correlate(
        osc_spectrum.coefficients(),
        price_spectrum.coefficients(),
    ))
}
