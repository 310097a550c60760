//! Input loading and output persistence

pub mod loader;
pub mod writer;

pub use loader::*;
pub use writer::*;
