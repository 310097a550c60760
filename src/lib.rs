//! Indicator Volatility - event-driven volatility analysis over zigzag pivots
//!
//! Measures how price moves around economic indicator announcements: movement
//! and speed in windows before and after each event, fixed intraday segment
//! volatility per day, cross-horizon scaling, and grouped statistics with
//! volatility classification.

pub mod config;
pub mod types;
pub mod errors;
pub mod windows;
pub mod analysis;
pub mod volatility;
pub mod statistics;
pub mod storage;
pub mod pipeline;
pub mod utils;

// Re-export commonly used items
pub use config::{Config, CONFIG};
pub use errors::{AnalysisError, AnalysisResult};
pub use types::*;
