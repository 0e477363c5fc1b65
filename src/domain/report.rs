//! Pipeline output types.
//!
//! `AnonymizationResult` is the single value object a run produces. It
//! carries everything downstream consumers (table export, UI rendering)
//! need; the pipeline itself holds no ambient state between runs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::span::{EntityKind, EntitySpan};

/// Aggregate counts for a single run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of entities that survived merging
    pub total_entities: usize,

    /// Surviving entities per category
    pub entity_counts: HashMap<EntityKind, usize>,

    /// Number of chunks the document was split into
    pub chunks_processed: usize,

    /// Number of (chunk, detector) calls that failed or timed out and
    /// were recovered as zero spans
    pub detector_failures: usize,
}

/// The complete outcome of one anonymization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationResult {
    /// The input text, unchanged
    pub original_text: String,

    /// The input text with every merged span replaced by `[KIND]`
    pub anonymized_text: String,

    /// Final merged spans, ordered by start offset, pairwise disjoint
    pub entities: Vec<EntitySpan>,

    pub statistics: Statistics,
}

impl AnonymizationResult {
    /// Assemble a result from the redacted text and merged span set.
    pub fn new(
        original_text: String,
        anonymized_text: String,
        entities: Vec<EntitySpan>,
        chunks_processed: usize,
        detector_failures: usize,
    ) -> Self {
        let mut entity_counts: HashMap<EntityKind, usize> = HashMap::new();
        for entity in &entities {
            *entity_counts.entry(entity.kind).or_insert(0) += 1;
        }

        let statistics = Statistics {
            total_entities: entities.len(),
            entity_counts,
            chunks_processed,
            detector_failures,
        };

        Self {
            original_text,
            anonymized_text,
            entities,
            statistics,
        }
    }
}
