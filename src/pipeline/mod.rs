//! End-to-end batch analysis pipeline

pub mod runner;
pub mod summary;

pub use runner::*;
pub use summary::*;
