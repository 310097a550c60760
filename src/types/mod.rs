//! Core data types and structures

pub mod pivot;
pub mod indicator;
pub mod window;
pub mod metrics;
pub mod event_analysis;
pub mod volatility;
pub mod statistics;
pub mod multiscale;

pub use pivot::*;
pub use indicator::*;
pub use window::*;
pub use metrics::*;
pub use event_analysis::*;
pub use volatility::*;
pub use statistics::*;
pub use multiscale::*;
