//! Per-bar labels: market phase, peak kind, subsequent movement, trading signal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Market-phase tag derived from close versus two trend averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseLabel {
    Accumulation,
    Distribution,
    Markup,
    Markdown,
    Unknown,
}

impl PhaseLabel {
    pub const ALL: [PhaseLabel; 5] = [
        PhaseLabel::Accumulation,
        PhaseLabel::Distribution,
        PhaseLabel::Markup,
        PhaseLabel::Markdown,
        PhaseLabel::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseLabel::Accumulation => "Accumulation",
            PhaseLabel::Distribution => "Distribution",
            PhaseLabel::Markup => "Markup",
            PhaseLabel::Markdown => "Markdown",
            PhaseLabel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PhaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which extremum an oscillator peak event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakKind {
    Top,
    Bottom,
}

impl PeakKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeakKind::Top => "Top",
            PeakKind::Bottom => "Bottom",
        }
    }
}

impl fmt::Display for PeakKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the close-to-close move on the bar after a peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceMovement {
    Up,
    Down,
}

impl PriceMovement {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceMovement::Up => "Up",
            PriceMovement::Down => "Down",
        }
    }
}

impl fmt::Display for PriceMovement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete per-bar trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingSignal {
    Buy,
    Sell,
    #[default]
    None,
}

impl TradingSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingSignal::Buy => "Buy",
            TradingSignal::Sell => "Sell",
            TradingSignal::None => "None",
        }
    }
}

impl fmt::Display for TradingSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
