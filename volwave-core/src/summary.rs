//! Run summary: signal, phase and peak tallies over an analysed series.

use serde::{Deserialize, Serialize};

use crate::domain::{PeakKind, PhaseLabel, PriceMovement, TradingSignal};
use crate::peaks::PeakEvent;
use crate::pipeline::BarAnalysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseCounts {
    pub accumulation: usize,
    pub distribution: usize,
    pub markup: usize,
    pub markdown: usize,
    pub unknown: usize,
}

impl PhaseCounts {
    pub fn add(&mut self, label: PhaseLabel) {
        match label {
            PhaseLabel::Accumulation => self.accumulation += 1,
            PhaseLabel::Distribution => self.distribution += 1,
            PhaseLabel::Markup => self.markup += 1,
            PhaseLabel::Markdown => self.markdown += 1,
            PhaseLabel::Unknown => self.unknown += 1,
        }
    }

    pub fn get(&self, label: PhaseLabel) -> usize {
        match label {
            PhaseLabel::Accumulation => self.accumulation,
            PhaseLabel::Distribution => self.distribution,
            PhaseLabel::Markup => self.markup,
            PhaseLabel::Markdown => self.markdown,
            PhaseLabel::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        PhaseLabel::ALL.iter().map(|l| self.get(*l)).sum()
    }
}

/// Movement tally for one peak kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeakStats {
    pub count: usize,
    pub up: usize,
    pub down: usize,
    pub no_movement: usize,
}

impl PeakStats {
    fn add(&mut self, movement: Option<PriceMovement>) {
        self.count += 1;
        match movement {
            Some(PriceMovement::Up) => self.up += 1,
            Some(PriceMovement::Down) => self.down += 1,
            None => self.no_movement += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub bars: usize,
    pub oscillator_defined: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub phases: PhaseCounts,
    pub tops: PeakStats,
    pub bottoms: PeakStats,
}

impl AnalysisSummary {
    pub fn from_records(records: &[BarAnalysis], peaks: &[PeakEvent]) -> Self {
        let mut summary = AnalysisSummary {
            bars: records.len(),
            ..Default::default()
        };
        for record in records {
            if record.oscillator.is_some() {
                summary.oscillator_defined += 1;
            }
            match record.signal {
                TradingSignal::Buy => summary.buy_signals += 1,
                TradingSignal::Sell => summary.sell_signals += 1,
                TradingSignal::None => {}
            }
            summary.phases.add(record.phase);
        }
        for peak in peaks {
            match peak.kind {
                PeakKind::Top => summary.tops.add(peak.movement),
                PeakKind::Bottom => summary.bottoms.add(peak.movement),
            }
        }
        summary
    }

    /// Share of peaks followed by a move against the extremum (Down after a
    /// Top, Up after a Bottom). `None` when no peak has a following bar.
    pub fn reversal_rate(&self) -> Option<f64> {
        let labelled = self.tops.up + self.tops.down + self.bottoms.up + self.bottoms.down;
        if labelled == 0 {
            return None;
        }
        Some((self.tops.down + self.bottoms.up) as f64 / labelled as f64)
    }
}
