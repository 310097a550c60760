//! Time windowing: fixed day segments, event-relative windows and pivot extraction

pub mod index;
pub mod extractor;

pub use index::*;
pub use extractor::*;
