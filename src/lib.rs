//! textscrub - Multi-backend PII redaction for clinical narrative text
//!
//! Redacts personally identifying content from free-form clinical text
//! before it is handed to downstream processing. Detection itself is
//! delegated to pluggable backends; this crate owns the pipeline around
//! them:
//! - Position-aware chunking that preserves global character offsets
//! - Global-offset reconciliation of chunk-local backend output
//! - Merging of overlapping/duplicate spans from disagreeing backends
//! - Right-to-left placeholder rewriting of the original text
//!
//! # Architecture
//!
//! - `domain`: Data structures (EntitySpan, Chunk, AnonymizationResult)
//! - `core`: Pipeline logic (Chunker, EntityMerger, Redactor, Anonymizer)
//! - `adapters`: Detection backend integrations (HTTP NER, rule-based)
//! - `config`: Pipeline configuration and validation
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use textscrub::{Anonymizer, PipelineConfig};
//! use textscrub::adapters::RuleDetector;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let anonymizer = Anonymizer::new(PipelineConfig::default())?
//!     .with_detector(Arc::new(RuleDetector::new()));
//!
//! let result = anonymizer.run("Patient reachable at jdoe@example.com.").await;
//! println!("{}", result.anonymized_text);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use config::{ConfigError, PipelineConfig};
pub use core::{Anonymizer, Chunker, EntityMerger, Redactor};
pub use domain::{AnonymizationResult, Chunk, EntityKind, EntitySpan, Statistics};
