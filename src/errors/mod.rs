//! Error taxonomy for the analysis pipeline

pub mod analysis_error;

pub use analysis_error::*;
