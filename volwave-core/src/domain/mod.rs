//! Domain types: the input bar and the per-bar labels the pipeline emits.

pub mod bar;
pub mod labels;

pub use bar::Bar;
pub use labels::{PeakKind, PhaseLabel, PriceMovement, TradingSignal};
