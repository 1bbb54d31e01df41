//! Discrete Fourier transform of a real sequence and its inverse.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// One frequency component: bin index, frequency in cycles per sample,
/// amplitude, and period in samples (`None` for the DC bin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyComponent {
    pub index: usize,
    pub frequency: f64,
    pub amplitude: f64,
    pub period: Option<f64>,
}

/// Frequency labels for an n-point transform, in cycles per sample.
///
/// Bin k maps to k/n for k <= (n-1)/2 and to (k-n)/n above that, so the
/// upper half carries the negative frequencies.
pub fn frequency_labels(n: usize) -> Vec<f64> {
    let half = n.saturating_sub(1) / 2;
    (0..n)
        .map(|k| {
            if k <= half {
                k as f64 / n as f64
            } else {
                (k as f64 - n as f64) / n as f64
            }
        })
        .collect()
}

/// Frequency-domain view of a real sequence: one complex coefficient and
/// one frequency label per sample.
#[derive(Debug, Clone)]
pub struct SpectralDecomposition {
    coefficients: Vec<Complex<f64>>,
    frequencies: Vec<f64>,
}

impl SpectralDecomposition {
    /// Forward-transform `samples`. An empty sequence is rejected.
    pub fn forward(samples: &[f64]) -> Result<Self, AnalysisError> {
        if samples.is_empty() {
            return Err(AnalysisError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let n = samples.len();
        let mut buffer: Vec<Complex<f64>> = samples.iter().map(|&x| Complex::new(x, 0.0)).collect();
        let mut planner = FftPlanner::<f64>::new();
        planner.plan_fft_forward(n).process(&mut buffer);

        Ok(Self {
            coefficients: buffer,
            frequencies: frequency_labels(n),
        })
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn coefficients(&self) -> &[Complex<f64>] {
        &self.coefficients
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Magnitude of every coefficient.
    pub fn amplitudes(&self) -> Vec<f64> {
        self.coefficients.iter().map(|c| c.norm()).collect()
    }

    /// Describe bin `index`.
    pub fn component(&self, index: usize) -> Option<FrequencyComponent> {
        let coefficient = self.coefficients.get(index)?;
        let frequency = self.frequencies[index];
        Some(FrequencyComponent {
            index,
            frequency,
            amplitude: coefficient.norm(),
            period: (frequency != 0.0).then(|| 1.0 / frequency.abs()),
        })
    }

    /// Largest-amplitude component; the lowest index wins ties.
    pub fn dominant(&self) -> Option<FrequencyComponent> {
        let amplitudes = self.amplitudes();
        let mut best: Option<usize> = None;
        for (i, &a) in amplitudes.iter().enumerate() {
            match best {
                Some(b) if a <= amplitudes[b] => {}
                _ => best = Some(i),
            }
        }
        best.and_then(|i| self.component(i))
    }

    /// Inverse-transform with every coefficient outside `selected` zeroed.
    ///
    /// One masked inverse over the full vector; the imaginary roundoff
    /// residue is dropped.
    pub fn reconstruct(&self, selected: &[usize]) -> Vec<f64> {
        let n = self.coefficients.len();
        let mut buffer = vec![Complex::new(0.0, 0.0); n];
        for &i in selected {
            if let Some(c) = self.coefficients.get(i) {
                buffer[i] = *c;
            }
        }

        let mut planner = FftPlanner::<f64>::new();
        planner.plan_fft_inverse(n).process(&mut buffer);

        let scale = 1.0 / n as f64;
        buffer.into_iter().map(|c| c.re * scale).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn frequency_labels_even_length() {
        let f = frequency_labels(4);
        assert_eq!(f, vec![0.0, 0.25, -0.5, -0.25]);
    }

    #[test]
    fn frequency_labels_odd_length() {
        let f = frequency_labels(5);
        assert_eq!(f, vec![0.0, 0.2, 0.4, -0.4, -0.2]);
    }

    #[test]
    fn empty_input_is_insufficient_data() {
        let err = SpectralDecomposition::forward(&[]).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                required: 1,
                available: 0
            }
        );
    }

    #[test]
    fn dc_component_of_constant_series() {
        let d = SpectralDecomposition::forward(&[2.0; 8]).unwrap();
        let amps = d.amplitudes();
        assert_approx(amps[0], 16.0, 1e-9);
        assert!(amps[1..].iter().all(|a| a.abs() < 1e-9));
        let dom = d.dominant().unwrap();
        assert_eq!(dom.index, 0);
        assert_eq!(dom.period, None);
    }

    #[test]
    fn dominant_finds_the_embedded_cycle() {
        // period-8 cosine over 64 samples lands in bins 8 and 56
        let samples: Vec<f64> = (0..64)
            .map(|i| (2.0 * std::f64::consts::PI * i as f64 / 8.0).cos())
            .collect();
        let d = SpectralDecomposition::forward(&samples).unwrap();
        let dom = d.dominant().unwrap();
        // bins 8 and 56 tie up to roundoff
        assert!(dom.index == 8 || dom.index == 56, "index {}", dom.index);
        assert_approx(dom.frequency.abs(), 0.125, 1e-12);
        assert_approx(dom.period.unwrap(), 8.0, 1e-9);
        assert_approx(dom.amplitude, 32.0, 1e-9);
    }

    #[test]
    fn full_reconstruction_is_identity() {
        let samples = [3.0, -1.0, 4.0, 1.0, -5.0, 9.0, 2.0];
        let d = SpectralDecomposition::forward(&samples).unwrap();
        let all: Vec<usize> = (0..samples.len()).collect();
        let back = d.reconstruct(&all);
        for (a, b) in back.iter().zip(samples.iter()) {
            assert_approx(*a, *b, 1e-9);
        }
    }

    #[test]
    fn empty_selection_reconstructs_zero() {
        let d = SpectralDecomposition::forward(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(d.reconstruct(&[]), vec![0.0, 0.0, 0.0]);
    }
}
