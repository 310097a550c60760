//! Per-event announcement analysis

pub mod asymmetric;

pub use asymmetric::*;
