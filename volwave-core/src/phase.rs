//! PhaseClassifier — per-bar market-phase tags from close versus a fast
//! and a slow trend average.
//!
//! Stateless: each bar is labelled from its own (close, fast, slow) triple.
//! The rules are an ordered decision table per trend regime; the first
//! matching row wins and a bar matching no row is `Unknown`.

use serde::{Deserialize, Serialize};

use crate::domain::bar::closes;
use crate::domain::{Bar, PhaseLabel};
use crate::error::AnalysisError;
use crate::indicators::{Indicator, Sma};

/// Handling of the band check in the downtrend regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseRule {
    /// Downtrend band is `slow < close < fast`, the same test as the
    /// uptrend row. With `fast < slow` it never holds, so Accumulation is
    /// never assigned.
    #[default]
    Literal,
    /// Downtrend band is `fast < close < slow` and labels Accumulation.
    ReversedAccumulation,
}

/// Trend regime from the ordering of the two averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendRegime {
    Up,
    Down,
    Flat,
}

impl TrendRegime {
    pub fn of(fast: f64, slow: f64) -> Self {
        if fast > slow {
            TrendRegime::Up
        } else if fast < slow {
            TrendRegime::Down
        } else {
            // equal, or either side NaN
            TrendRegime::Flat
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Fast,
    Slow,
}

/// Strict comparison of close against the averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Condition {
    Between { lower: Bound, upper: Bound },
    Above(Bound),
    Below(Bound),
}

impl Condition {
    fn holds(&self, close: f64, fast: f64, slow: f64) -> bool {
        let value = |b: Bound| match b {
            Bound::Fast => fast,
            Bound::Slow => slow,
        };
        match *self {
            Condition::Between { lower, upper } => value(lower) < close && close < value(upper),
            Condition::Above(b) => close > value(b),
            Condition::Below(b) => close < value(b),
        }
    }
}

type Row = (Condition, PhaseLabel);

const UPTREND: [Row; 3] = [
    (
        Condition::Between {
            lower: Bound::Slow,
            upper: Bound::Fast,
        },
        PhaseLabel::Distribution,
    ),
    (Condition::Above(Bound::Fast), PhaseLabel::Markup),
    (Condition::Below(Bound::Slow), PhaseLabel::Markdown),
];

const DOWNTREND_LITERAL: [Row; 3] = [
    (
        Condition::Between {
            lower: Bound::Slow,
            upper: Bound::Fast,
        },
        PhaseLabel::Accumulation,
    ),
    (Condition::Above(Bound::Fast), PhaseLabel::Markup),
    (Condition::Below(Bound::Slow), PhaseLabel::Markdown),
];

const DOWNTREND_REVERSED: [Row; 3] = [
    (
        Condition::Between {
            lower: Bound::Fast,
            upper: Bound::Slow,
        },
        PhaseLabel::Accumulation,
    ),
    (Condition::Above(Bound::Fast), PhaseLabel::Markup),
    (Condition::Below(Bound::Slow), PhaseLabel::Markdown),
];

#[derive(Debug, Clone)]
pub struct PhaseClassifier {
    fast: Sma,
    slow: Sma,
    rule: PhaseRule,
}

impl PhaseClassifier {
    pub fn new(fast_window: usize, slow_window: usize, rule: PhaseRule) -> Result<Self, AnalysisError> {
        if fast_window == 0 || slow_window <= fast_window {
            return Err(AnalysisError::InvalidConfig(format!(
                "phase windows need 0 < fast ({fast_window}) < slow ({slow_window})"
            )));
        }
        Ok(Self {
            fast: Sma::close(fast_window),
            slow: Sma::close(slow_window),
            rule,
        })
    }

    pub fn rule(&self) -> PhaseRule {
        self.rule
    }

    fn table(&self, regime: TrendRegime) -> &'static [Row] {
        match (regime, self.rule) {
            (TrendRegime::Up, _) => &UPTREND,
            (TrendRegime::Down, PhaseRule::Literal) => &DOWNTREND_LITERAL,
            (TrendRegime::Down, PhaseRule::ReversedAccumulation) => &DOWNTREND_REVERSED,
            (TrendRegime::Flat, _) => &[],
        }
    }

    /// Label one bar.
    pub fn classify(&self, close: f64, fast: f64, slow: f64) -> PhaseLabel {
        self.table(TrendRegime::of(fast, slow))
            .iter()
            .find(|(condition, _)| condition.holds(close, fast, slow))
            .map(|(_, label)| *label)
            .unwrap_or(PhaseLabel::Unknown)
    }

    /// Label aligned series. Bars without both averages are `Unknown`.
    pub fn classify_series(
        &self,
        closes: &[f64],
        fast: &[Option<f64>],
        slow: &[Option<f64>],
    ) -> Result<Vec<PhaseLabel>, AnalysisError> {
        AnalysisError::check_len("fast_ma", closes.len(), fast.len())?;
        AnalysisError::check_len("slow_ma", closes.len(), slow.len())?;
        Ok(closes
            .iter()
            .zip(fast.iter().zip(slow))
            .map(|(&close, pair)| match pair {
                (Some(f), Some(s)) => self.classify(close, *f, *s),
                _ => PhaseLabel::Unknown,
            })
            .collect())
    }

    /// Compute both averages over the bars and label every bar.
    pub fn classify_bars(&self, bars: &[Bar]) -> Vec<PhaseLabel> {
        let fast = self.fast.compute(bars);
        let slow = self.slow.compute(bars);
        closes(bars)
            .into_iter()
            .zip(fast.into_iter().zip(slow))
            .map(|(close, pair)| match pair {
                (Some(f), Some(s)) => self.classify(close, f, s),
                _ => PhaseLabel::Unknown,
            })
            .collect()
    }
}
