//! Pipeline logic: chunking, merging, rewriting, orchestration.

pub mod chunker;
pub mod merge;
pub mod orchestrator;
pub mod redact;

pub use chunker::Chunker;
pub use merge::EntityMerger;
pub use orchestrator::Anonymizer;
pub use redact::Redactor;
