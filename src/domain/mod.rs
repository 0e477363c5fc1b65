//! Data structures shared across the pipeline.

pub mod chunk;
pub mod report;
pub mod span;

pub use chunk::Chunk;
pub use report::{AnonymizationResult, Statistics};
pub use span::{EntityKind, EntitySpan};
