//! Fixed-window and multi-timeframe volatility analysis

pub mod calculator;
pub mod multi_timeframe;

pub use calculator::*;
pub use multi_timeframe::*;
