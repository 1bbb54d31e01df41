//! Volume oscillator — normalized spread between a short and a long
//! rolling mean of volume.
//!
//! `osc[i] = scale * (short_avg[i] - long_avg[i]) / long_avg[i]`
//!
//! Lookback: long_period - 1. A zero long average also yields `None`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::sma::rolling_mean;
use super::Indicator;
use crate::domain::bar::volumes;
use crate::domain::Bar;
use crate::error::AnalysisError;

/// Output scaling of the oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OscillatorScale {
    /// Percentage deviation (x100).
    #[default]
    Percent,
    /// Unscaled ratio.
    Ratio,
}

impl OscillatorScale {
    pub fn factor(&self) -> f64 {
        match self {
            OscillatorScale::Percent => 100.0,
            OscillatorScale::Ratio => 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VolumeOscillator {
    short_period: usize,
    long_period: usize,
    scale: OscillatorScale,
    name: String,
}

impl VolumeOscillator {
    pub fn new(
        short_period: usize,
        long_period: usize,
        scale: OscillatorScale,
    ) -> Result<Self, AnalysisError> {
        if short_period == 0 {
            return Err(AnalysisError::InvalidConfig(
                "oscillator short_period must be >= 1".into(),
            ));
        }
        if long_period <= short_period {
            return Err(AnalysisError::InvalidConfig(format!(
                "oscillator long_period ({long_period}) must exceed short_period ({short_period})"
            )));
        }
        Ok(Self {
            short_period,
            long_period,
            scale,
            name: format!("vol_osc_{short_period}_{long_period}"),
        })
    }

    /// Compute the oscillator and pair each value with its bar timestamp.
    pub fn build(&self, bars: &[Bar]) -> OscillatorSeries {
        OscillatorSeries {
            timestamps: bars.iter().map(|b| b.timestamp).collect(),
            values: self.compute(bars),
        }
    }
}

impl Indicator for VolumeOscillator {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.long_period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let volume = volumes(bars);
        let short_avg = rolling_mean(&volume, self.short_period);
        let long_avg = rolling_mean(&volume, self.long_period);
        let factor = self.scale.factor();

        short_avg
            .into_iter()
            .zip(long_avg)
            .map(|pair| match pair {
                (Some(short), Some(long)) if long != 0.0 => {
                    Some(factor * (short - long) / long)
                }
                _ => None,
            })
            .collect()
    }
}

/// Oscillator values aligned 1:1 with the bars they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorSeries {
    timestamps: Vec<NaiveDateTime>,
    values: Vec<Option<f64>>,
}

impl OscillatorSeries {
    /// Build a series from raw values; timestamps are taken from `bars`.
    pub fn from_values(bars: &[Bar], values: Vec<Option<f64>>) -> Result<Self, AnalysisError> {
        AnalysisError::check_len("oscillator", bars.len(), values.len())?;
        Ok(Self {
            timestamps: bars.iter().map(|b| b.timestamp).collect(),
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Values with `None` replaced by 0.0, for the frequency transform only.
    pub fn zero_filled(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.unwrap_or(0.0)).collect()
    }

    /// Number of bars that carry a value.
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn rejects_bad_windows() {
        assert!(VolumeOscillator::new(0, 28, OscillatorScale::Percent).is_err());
        assert!(VolumeOscillator::new(28, 28, OscillatorScale::Percent).is_err());
        assert!(VolumeOscillator::new(50, 10, OscillatorScale::Percent).is_err());
        assert!(VolumeOscillator::new(14, 28, OscillatorScale::Percent).is_ok());
    }

    #[test]
    fn percent_oscillator_values() {
        // volumes 100, 100, 100, 400
        // i=2: short(2)=100, long(3)=100 -> 0
        // i=3: short(2)=250, long(3)=200 -> 25%
        let bars = make_bars(&[1.0; 4], &[100.0, 100.0, 100.0, 400.0]);
        let osc = VolumeOscillator::new(2, 3, OscillatorScale::Percent).unwrap();
        let values = osc.compute(&bars);
        assert_eq!(values[0], None);
        assert_eq!(values[1], None);
        assert_approx(values[2].unwrap(), 0.0, DEFAULT_EPSILON);
        assert_approx(values[3].unwrap(), 25.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ratio_scale_drops_the_factor() {
        let bars = make_bars(&[1.0; 4], &[100.0, 100.0, 100.0, 400.0]);
        let osc = VolumeOscillator::new(2, 3, OscillatorScale::Ratio).unwrap();
        assert_approx(osc.compute(&bars)[3].unwrap(), 0.25, DEFAULT_EPSILON);
    }

    #[test]
    fn warmup_is_long_period_minus_one() {
        let bars = make_bars(&[1.0; 40], &[1000.0; 40]);
        let osc = VolumeOscillator::new(14, 28, OscillatorScale::Percent).unwrap();
        assert_eq!(osc.lookback(), 27);
        let series = osc.build(&bars);
        assert_eq!(series.len(), 40);
        assert!(series.values()[..27].iter().all(|v| v.is_none()));
        assert!(series.values()[27..].iter().all(|v| v.is_some()));
        assert_eq!(series.defined_count(), 13);
    }

    #[test]
    fn zero_long_average_is_no_value() {
        let bars = make_bars(&[1.0; 5], &[0.0; 5]);
        let osc = VolumeOscillator::new(2, 3, OscillatorScale::Percent).unwrap();
        assert!(osc.compute(&bars).iter().all(|v| v.is_none()));
    }

    #[test]
    fn zero_fill_is_local_to_the_copy() {
        let bars = make_bars(&[1.0; 3], &[1.0; 3]);
        let series = OscillatorSeries::from_values(&bars, vec![None, Some(2.0), None]).unwrap();
        assert_eq!(series.zero_filled(), vec![0.0, 2.0, 0.0]);
        assert_eq!(series.get(0), None);
        assert_eq!(series.get(1), Some(2.0));
        assert_eq!(series.timestamps()[1], bars[1].timestamp);
    }

    #[test]
    fn from_values_checks_alignment() {
        let bars = make_bars(&[1.0; 3], &[1.0; 3]);
        assert!(OscillatorSeries::from_values(&bars, vec![None]).is_err());
    }
}
