//! SpectralAnalyzer — keeps the dominant frequency components of the
//! oscillator and rebuilds a filtered time-domain signal from them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::percentile::percentile;
use super::transform::{FrequencyComponent, SpectralDecomposition};
use crate::error::AnalysisError;
use crate::indicators::OscillatorSeries;

/// How frequency components are chosen for reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ComponentSelection {
    /// Components whose amplitude strictly exceeds the given percentile
    /// of all amplitudes.
    Percentile { percentile: f64 },
    /// The `k` largest amplitudes (lower index wins ties).
    TopK { k: usize },
    /// Every component; the reconstruction reproduces the input.
    All,
}

impl Default for ComponentSelection {
    fn default() -> Self {
        ComponentSelection::Percentile { percentile: 90.0 }
    }
}

impl ComponentSelection {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        match *self {
            ComponentSelection::Percentile { percentile } if !(0.0..=100.0).contains(&percentile) => {
                Err(AnalysisError::InvalidConfig(format!(
                    "amplitude percentile must be within 0..=100, got {percentile}"
                )))
            }
            ComponentSelection::TopK { k: 0 } => Err(AnalysisError::InvalidConfig(
                "top_k selection needs k >= 1".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Pick component indices from an amplitude spectrum.
///
/// Returns the selected indices in ascending order and, for percentile
/// selection, the amplitude threshold that was applied.
pub fn select_components(
    amplitudes: &[f64],
    selection: &ComponentSelection,
) -> (Vec<usize>, Option<f64>) {
    match *selection {
        ComponentSelection::Percentile { percentile: p } => match percentile(amplitudes, p) {
            Some(threshold) => {
                let selected = amplitudes
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| **a > threshold)
                    .map(|(i, _)| i)
                    .collect();
                (selected, Some(threshold))
            }
            None => (Vec::new(), None),
        },
        ComponentSelection::TopK { k } => {
            let mut order: Vec<usize> = (0..amplitudes.len()).collect();
            order.sort_by(|&a, &b| amplitudes[b].total_cmp(&amplitudes[a]).then(a.cmp(&b)));
            order.truncate(k);
            order.sort_unstable();
            (order, None)
        }
        ComponentSelection::All => ((0..amplitudes.len()).collect(), None),
    }
}

/// Which oscillator samples enter the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupPolicy {
    /// Missing values enter as 0 and every bar gets a reconstructed value.
    #[default]
    ZeroFill,
    /// Only defined values are transformed. Bars without an oscillator
    /// value get no reconstruction.
    DefinedOnly,
}

#[derive(Debug, Clone, Default)]
pub struct SpectralAnalyzer {
    selection: ComponentSelection,
    warmup: WarmupPolicy,
}

impl SpectralAnalyzer {
    pub fn new(selection: ComponentSelection) -> Self {
        Self {
            selection,
            warmup: WarmupPolicy::default(),
        }
    }

    pub fn with_warmup(mut self, warmup: WarmupPolicy) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn selection(&self) -> &ComponentSelection {
        &self.selection
    }

    /// Analyze an oscillator series under the configured warmup policy.
    /// The aligned reconstruction always has one entry per bar.
    pub fn analyze(&self, oscillator: &OscillatorSeries) -> Result<SpectralAnalysis, AnalysisError> {
        match self.warmup {
            WarmupPolicy::ZeroFill => self.analyze_samples(&oscillator.zero_filled()),
            WarmupPolicy::DefinedOnly => {
                let (positions, samples): (Vec<usize>, Vec<f64>) = oscillator
                    .values()
                    .iter()
                    .enumerate()
                    .filter_map(|(i, v)| v.map(|x| (i, x)))
                    .unzip();
                let mut analysis = self.analyze_samples(&samples)?;
                let mut aligned = vec![None; oscillator.len()];
                for (&i, &value) in positions.iter().zip(&analysis.reconstructed) {
                    aligned[i] = Some(value);
                }
                analysis.aligned = aligned;
                Ok(analysis)
            }
        }
    }

    /// Analyze a finite real sequence.
    pub fn analyze_samples(&self, samples: &[f64]) -> Result<SpectralAnalysis, AnalysisError> {
        let decomposition = SpectralDecomposition::forward(samples)?;
        let amplitudes = decomposition.amplitudes();
        let (selected, amplitude_threshold) = select_components(&amplitudes, &self.selection);
        let reconstructed = decomposition.reconstruct(&selected);

        debug!(
            samples = samples.len(),
            selected = selected.len(),
            threshold = ?amplitude_threshold,
            "spectral components selected"
        );

        let aligned = reconstructed.iter().copied().map(Some).collect();
        Ok(SpectralAnalysis {
            decomposition,
            selected,
            amplitude_threshold,
            reconstructed,
            aligned,
        })
    }
}

/// Result of one spectral pass.
#[derive(Debug, Clone)]
pub struct SpectralAnalysis {
    decomposition: SpectralDecomposition,
    selected: Vec<usize>,
    amplitude_threshold: Option<f64>,
    reconstructed: Vec<f64>,
    aligned: Vec<Option<f64>>,
}

impl SpectralAnalysis {
    pub fn decomposition(&self) -> &SpectralDecomposition {
        &self.decomposition
    }

    /// Indices of the coefficients kept for reconstruction, ascending.
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn amplitude_threshold(&self) -> Option<f64> {
        self.amplitude_threshold
    }

    /// Filtered time-domain signal, same length as the transformed samples.
    pub fn reconstructed(&self) -> &[f64] {
        &self.reconstructed
    }

    /// Reconstruction placed back on the analysed bars; `None` where a bar
    /// did not enter the transform.
    pub fn aligned(&self) -> &[Option<f64>] {
        &self.aligned
    }

    /// Selected components, strongest first.
    pub fn components(&self) -> Vec<FrequencyComponent> {
        let mut components: Vec<FrequencyComponent> = self
            .selected
            .iter()
            .filter_map(|&i| self.decomposition.component(i))
            .collect();
        components.sort_by(|a, b| b.amplitude.total_cmp(&a.amplitude).then(a.index.cmp(&b.index)));
        components
    }

    pub fn dominant(&self) -> Option<FrequencyComponent> {
        self.decomposition.dominant()
    }
}
