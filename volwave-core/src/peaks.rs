//! PeakDetector — separated local extrema of the oscillator and the price
//! move on the following bar.
//!
//! Candidates are strict local maxima: a sample (or a flat run of equal
//! samples) whose neighbours on both sides are defined and lower. A flat
//! run contributes its middle index (lower middle for even runs). The
//! first and last samples are never candidates.
//!
//! Separation: candidates are visited from the highest value down (earliest
//! index first on equal values); each kept candidate removes every other
//! candidate closer than `min_separation` samples.
//!
//! Bottoms are the tops of the negated series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{PeakKind, PriceMovement};
use crate::error::AnalysisError;
use crate::indicators::OscillatorSeries;

/// A separated oscillator extremum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakEvent {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub kind: PeakKind,
    /// Oscillator value at the extremum.
    pub value: f64,
    /// `None` when the peak is on the last bar.
    pub movement: Option<PriceMovement>,
}

#[derive(Debug, Clone)]
pub struct PeakDetector {
    min_separation: usize,
}

impl PeakDetector {
    pub fn new(min_separation: usize) -> Result<Self, AnalysisError> {
        if min_separation == 0 {
            return Err(AnalysisError::InvalidConfig(
                "peak min_separation must be >= 1".into(),
            ));
        }
        Ok(Self { min_separation })
    }

    /// Indices of separated local maxima.
    pub fn tops(&self, values: &[Option<f64>]) -> Vec<usize> {
        let candidates = local_maxima(values);
        suppress_within(&candidates, values, self.min_separation)
    }

    /// Indices of separated local minima.
    pub fn bottoms(&self, values: &[Option<f64>]) -> Vec<usize> {
        let negated: Vec<Option<f64>> = values.iter().map(|v| v.map(|x| -x)).collect();
        self.tops(&negated)
    }

    /// Find tops and bottoms of the oscillator and label the next-bar move
    /// of `closes`. Events are returned in index order.
    pub fn detect(
        &self,
        oscillator: &OscillatorSeries,
        closes: &[f64],
    ) -> Result<Vec<PeakEvent>, AnalysisError> {
        AnalysisError::check_len("close", oscillator.len(), closes.len())?;

        let values = oscillator.values();
        let timestamps = oscillator.timestamps();
        let tops = self.tops(values);
        let bottoms = self.bottoms(values);

        debug!(
            tops = tops.len(),
            bottoms = bottoms.len(),
            min_separation = self.min_separation,
            "oscillator peaks detected"
        );

        let mut events: Vec<PeakEvent> = tops
            .into_iter()
            .map(|i| (i, PeakKind::Top))
            .chain(bottoms.into_iter().map(|i| (i, PeakKind::Bottom)))
            .filter_map(|(index, kind)| {
                let value = oscillator.get(index)?;
                Some(PeakEvent {
                    index,
                    timestamp: timestamps[index],
                    kind,
                    value,
                    movement: movement_after(kind, closes, index),
                })
            })
            .collect();
        events.sort_by_key(|e| e.index);
        Ok(events)
    }
}

/// Direction of the close change from `index` to `index + 1`.
///
/// After a Top a flat close counts as Up; after a Bottom it counts as Down.
/// Returns `None` on the last bar or when either close is not finite.
pub fn movement_after(kind: PeakKind, closes: &[f64], index: usize) -> Option<PriceMovement> {
    let current = *closes.get(index)?;
    let next = *closes.get(index + 1)?;
    let change = next - current;
    if !change.is_finite() {
        return None;
    }
    Some(match kind {
        PeakKind::Top if change < 0.0 => PriceMovement::Down,
        PeakKind::Top => PriceMovement::Up,
        PeakKind::Bottom if change > 0.0 => PriceMovement::Up,
        PeakKind::Bottom => PriceMovement::Down,
    })
}

/// Strict local maxima with plateau handling.
pub fn local_maxima(values: &[Option<f64>]) -> Vec<usize> {
    let n = values.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }

    let last = n - 1;
    let mut i = 1;
    while i < last {
        let (Some(prev), Some(current)) = (values[i - 1], values[i]) else {
            i += 1;
            continue;
        };
        if prev < current {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == Some(current) {
                ahead += 1;
            }
            if matches!(values[ahead], Some(next) if next < current) {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}

/// Drop candidates closer than `distance` to a higher (or equal and
/// earlier) kept candidate. `candidates` must be ascending.
pub fn suppress_within(candidates: &[usize], values: &[Option<f64>], distance: usize) -> Vec<usize> {
    let m = candidates.len();
    let height = |j: usize| values[candidates[j]].unwrap_or(f64::NEG_INFINITY);

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| height(b).total_cmp(&height(a)).then(a.cmp(&b)));

    let mut keep = vec![true; m];
    for &j in &order {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && candidates[j] - candidates[k - 1] < distance {
            k -= 1;
            keep[k] = false;
        }
        let mut k = j + 1;
        while k < m && candidates[k] - candidates[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    candidates
        .iter()
        .zip(keep)
        .filter(|(_, kept)| *kept)
        .map(|(&i, _)| i)
        .collect()
}
