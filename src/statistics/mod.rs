//! Statistical aggregation, classification and distribution analysis

pub mod aggregator;
pub mod classification;
pub mod distribution;

pub use aggregator::*;
pub use classification::*;
pub use distribution::*;
