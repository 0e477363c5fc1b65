//! Pipeline orchestration.
//!
//! Drives a full anonymization run: chunk the text, fan detection out
//! over every (chunk, detector) pair, join, merge, rewrite, count.
//! A failed or timed-out detector call contributes zero spans and is
//! recorded in the statistics; it never aborts the run or cancels its
//! siblings. Under-redaction is countable, a hard failure would block
//! the whole document.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::adapters::Detector;
use crate::config::{ConfigError, PipelineConfig};
use crate::domain::{AnonymizationResult, EntitySpan};

use super::chunker::Chunker;
use super::merge::EntityMerger;
use super::redact::Redactor;

/// The anonymization pipeline.
///
/// Holds the configuration and the registered detection backends; each
/// call to [`run`](Anonymizer::run) is independent and side-effect free.
pub struct Anonymizer {
    config: PipelineConfig,
    chunker: Chunker,
    detectors: Vec<Arc<dyn Detector>>,
}

impl Anonymizer {
    /// Create a pipeline, rejecting invalid configuration up front.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let chunker = Chunker::new(&config);

        Ok(Self {
            config,
            chunker,
            detectors: Vec::new(),
        })
    }

    /// Register a detection backend
    pub fn with_detector(mut self, detector: Arc<dyn Detector>) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Run the full pipeline over `text`.
    ///
    /// Results are deterministic regardless of the order in which
    /// detection tasks complete: spans are fully collected, restored to
    /// fan-out order and globally re-sorted inside the merge.
    #[instrument(skip_all, fields(text_chars = text.chars().count()))]
    pub async fn run(&self, text: &str) -> AnonymizationResult {
        let chunks = self.chunker.split(text);

        info!(
            chunks = chunks.len(),
            detectors = self.detectors.len(),
            "Starting anonymization run"
        );

        let detector_timeout = self.config.detector_timeout();
        let detector_count = self.detectors.len();

        // One task per (chunk, detector) pair. Each task is tagged with
        // its fan-out slot so completion order cannot leak into results.
        let mut tasks: JoinSet<(usize, String, anyhow::Result<Vec<EntitySpan>>)> = JoinSet::new();

        for chunk in &chunks {
            for (detector_idx, detector) in self.detectors.iter().enumerate() {
                let slot = chunk.index * detector_count + detector_idx;
                let detector = Arc::clone(detector);
                let chunk = chunk.clone();

                tasks.spawn(async move {
                    let name = detector.name().to_string();
                    let outcome =
                        match tokio::time::timeout(detector_timeout, detector.detect(&chunk)).await
                        {
                            Ok(result) => result,
                            Err(_) => Err(anyhow::anyhow!(
                                "detector '{}' timed out after {:?} on chunk {}",
                                name,
                                detector_timeout,
                                chunk.index
                            )),
                        };
                    (slot, name, outcome)
                });
            }
        }

        // Single join barrier: collect everything before merging
        let mut slots: Vec<Vec<EntitySpan>> = vec![Vec::new(); chunks.len() * detector_count];
        let mut detector_failures = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, name, Ok(spans))) => {
                    debug!(detector = %name, slot, spans = spans.len(), "Detection task finished");
                    slots[slot] = spans;
                }
                Ok((slot, name, Err(error))) => {
                    warn!(
                        detector = %name,
                        slot,
                        %error,
                        "Detector call failed, contributing zero spans"
                    );
                    detector_failures += 1;
                }
                Err(join_error) => {
                    warn!(%join_error, "Detection task panicked, contributing zero spans");
                    detector_failures += 1;
                }
            }
        }

        let all_spans: Vec<EntitySpan> = slots.into_iter().flatten().collect();
        debug!(total = all_spans.len(), "Collected raw spans");

        let merged = EntityMerger::merge(&all_spans, self.config.confidence_threshold);
        let anonymized = Redactor::redact(text, &merged);

        info!(
            entities = merged.len(),
            failures = detector_failures,
            "Anonymization run complete"
        );

        AnonymizationResult::new(
            text.to_string(),
            anonymized,
            merged,
            chunks.len(),
            detector_failures,
        )
    }

    /// Convenience alias for [`run`](Anonymizer::run)
    pub async fn anonymize(&self, text: &str) -> AnonymizationResult {
        self.run(text).await
    }
}
