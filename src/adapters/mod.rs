//! Detection backend adapters.
//!
//! Every entity-detection backend sits behind the [`Detector`] trait:
//! given a chunk, it returns spans with **global** character offsets.
//! The shared [`resolve_detections`] step does the heavy lifting for
//! adapters: locating the reported text in the chunk, clamping
//! malformed offsets, mapping native labels onto the shared taxonomy
//! and converting chunk-local positions to global ones. Malformed
//! backend output degrades to "entity dropped", never to a failure.

pub mod http;
pub mod rules;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::domain::{Chunk, EntityKind, EntitySpan};

pub use http::HttpNerDetector;
pub use rules::RuleDetector;

/// Longest entity the resolution step will accept from clamped backend
/// offsets. Anything larger is assumed to be garbage positions.
const MAX_ENTITY_CHARS: usize = 200;

/// Trait for entity-detection backends.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Backend name, recorded as span provenance
    fn name(&self) -> &str;

    /// Detect entities in one chunk.
    ///
    /// Returned spans must carry global offsets; implementations are
    /// expected to go through [`resolve_detections`]. Errors are
    /// recovered by the orchestrator as zero spans for this chunk.
    async fn detect(&self, chunk: &Chunk) -> Result<Vec<EntitySpan>>;
}

/// Raw, chunk-local backend output before offset reconciliation.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// Text of the match as the backend reports it (may contain
    /// tokenizer artifacts)
    pub text: String,

    /// Backend-native label, resolved through a [`LabelMap`]
    pub label: String,

    /// Confidence in [0, 1]
    pub score: f64,

    /// Reported start offset, local to the chunk (not trusted)
    pub start: usize,

    /// Reported end offset, local to the chunk (not trusted)
    pub end: usize,
}

/// Per-adapter mapping from native labels to the shared taxonomy.
///
/// Total: unmapped labels resolve to the fallback (`Other` unless
/// overridden), so downstream code never sees raw label strings.
#[derive(Debug, Clone)]
pub struct LabelMap {
    mappings: HashMap<String, EntityKind>,
    fallback: EntityKind,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelMap {
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
            fallback: EntityKind::Other,
        }
    }

    /// Register a native label
    pub fn map(mut self, native: &str, kind: EntityKind) -> Self {
        self.mappings.insert(native.to_string(), kind);
        self
    }

    pub fn with_fallback(mut self, fallback: EntityKind) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn resolve(&self, native: &str) -> EntityKind {
        self.mappings.get(native).copied().unwrap_or(self.fallback)
    }
}

/// True if a detected text is an echo of a previously emitted
/// placeholder token. Used by adapters that may re-scan already
/// redacted text, so reprocessing stays idempotent.
pub fn is_placeholder_echo(text: &str) -> bool {
    let upper = text.to_uppercase();
    EntityKind::labels().iter().any(|label| upper.contains(label))
}

/// Reconcile raw backend output against the chunk and convert to
/// global offsets.
///
/// Localization fallback order (a known approximation: substring
/// search picks the first occurrence if the entity text appears twice
/// in the chunk):
/// 1. strip tokenizer artifacts and search the cleaned text in the
///    chunk;
/// 2. clamp the reported offsets into the chunk and accept the
///    extracted text if it is non-empty and below the sanity bound;
/// 3. drop the detection with a warning.
pub fn resolve_detections(
    chunk: &Chunk,
    detections: Vec<RawDetection>,
    labels: &LabelMap,
    source: &str,
) -> Vec<EntitySpan> {
    let chunk_chars: Vec<char> = chunk.text.chars().collect();
    let chunk_len = chunk_chars.len();

    let mut spans = Vec::new();

    for detection in detections {
        // Tokenizers leave subword markers in the reported text
        let clean = detection
            .text
            .replace("##", "")
            .replace('\u{2581}', " ")
            .trim()
            .to_string();

        let located = locate_by_search(&chunk.text, &clean)
            .or_else(|| locate_by_offsets(&chunk_chars, chunk_len, &detection));

        let (local_start, text) = match located {
            Some(found) => found,
            None => {
                warn!(
                    entity = %detection.text,
                    chunk = chunk.index,
                    source,
                    "Could not locate entity in chunk, dropping"
                );
                continue;
            }
        };

        let local_end = local_start + text.chars().count();

        spans.push(EntitySpan {
            text,
            kind: labels.resolve(&detection.label),
            score: detection.score,
            start: chunk.start_offset + local_start,
            end: chunk.start_offset + local_end,
            chunk_index: chunk.index,
            source: source.to_string(),
        });
    }

    spans
}

/// Primary localization path: find the cleaned entity text in the
/// chunk. Returns the character offset of the first occurrence.
fn locate_by_search(chunk_text: &str, clean: &str) -> Option<(usize, String)> {
    if clean.is_empty() {
        return None;
    }

    let byte_idx = chunk_text.find(clean)?;
    let char_idx = chunk_text[..byte_idx].chars().count();
    Some((char_idx, clean.to_string()))
}

/// Fallback localization path: trust the backend's offsets after
/// clamping them into the chunk.
fn locate_by_offsets(
    chunk_chars: &[char],
    chunk_len: usize,
    detection: &RawDetection,
) -> Option<(usize, String)> {
    let local_start = if detection.start >= chunk_len {
        0
    } else {
        detection.start
    };
    let local_end = detection.end.min(chunk_len);

    if local_end <= local_start {
        return None;
    }

    let extracted: String = chunk_chars[local_start..local_end].iter().collect();
    let trimmed = extracted.trim();

    if trimmed.is_empty() || extracted.chars().count() >= MAX_ENTITY_CHARS {
        return None;
    }

    Some((local_start, trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, start_offset: usize, index: usize) -> Chunk {
        Chunk {
            text: text.to_string(),
            start_offset,
            end_offset: start_offset + text.chars().count(),
            index,
        }
    }

    fn detection(text: &str, label: &str, start: usize, end: usize) -> RawDetection {
        RawDetection {
            text: text.to_string(),
            label: label.to_string(),
            score: 0.9,
            start,
            end,
        }
    }

    fn name_labels() -> LabelMap {
        LabelMap::new().map("PER", EntityKind::Name)
    }

    #[test]
    fn test_search_localization_with_global_conversion() {
        let chunk = chunk("Seen by Dr Martin today.", 1000, 4);
        let spans = resolve_detections(
            &chunk,
            vec![detection("Martin", "PER", 0, 0)],
            &name_labels(),
            "ner-model",
        );

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 1011);
        assert_eq!(spans[0].end, 1017);
        assert_eq!(spans[0].kind, EntityKind::Name);
        assert_eq!(spans[0].chunk_index, 4);
        assert_eq!(spans[0].source, "ner-model");
    }

    #[test]
    fn test_tokenizer_artifacts_stripped_before_search() {
        let chunk = chunk("Patient Dupont admitted.", 0, 0);
        let spans = resolve_detections(
            &chunk,
            vec![detection("Du##pont", "PER", 0, 0)],
            &name_labels(),
            "ner-model",
        );

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Dupont");
        assert_eq!(spans[0].start, 8);
        assert_eq!(spans[0].end, 14);
    }

    #[test]
    fn test_offset_fallback_when_text_not_found() {
        // Backend garbled the text but the offsets are good
        let chunk = chunk("Call 0612345678 tomorrow.", 50, 1);
        let spans = resolve_detections(
            &chunk,
            vec![detection("O6I2345678", "PHONE", 5, 15)],
            &LabelMap::new().map("PHONE", EntityKind::Phone),
            "ner-model",
        );

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "0612345678");
        assert_eq!(spans[0].start, 55);
        assert_eq!(spans[0].end, 65);
    }

    #[test]
    fn test_unlocatable_detection_dropped() {
        let chunk = chunk("short text", 0, 0);
        let spans = resolve_detections(
            &chunk,
            // Text absent and offsets inverted after clamping
            vec![detection("missing", "PER", 8, 3)],
            &name_labels(),
            "ner-model",
        );
        assert!(spans.is_empty());
    }

    #[test]
    fn test_out_of_range_offsets_clamped() {
        let chunk = chunk("Name: Durand", 0, 0);
        // start beyond the chunk resets to 0, end clamps to chunk length
        let spans = resolve_detections(
            &chunk,
            vec![detection("zzz", "PER", 999, 999)],
            &name_labels(),
            "ner-model",
        );

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[0].text, "Name: Durand");
    }

    #[test]
    fn test_fallback_override() {
        // A backend that only ever reports miscellaneous PII can widen
        // the default fallback
        let labels = LabelMap::new()
            .map("PER", EntityKind::Name)
            .with_fallback(EntityKind::Misc);

        assert_eq!(labels.resolve("PER"), EntityKind::Name);
        assert_eq!(labels.resolve("SOMETHING_NEW"), EntityKind::Misc);
    }

    #[test]
    fn test_unmapped_label_falls_back_to_other() {
        let chunk = chunk("something odd here", 0, 0);
        let spans = resolve_detections(
            &chunk,
            vec![detection("odd", "WEIRD_LABEL", 0, 0)],
            &name_labels(),
            "ner-model",
        );

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, EntityKind::Other);
    }

    #[test]
    fn test_substring_search_picks_first_occurrence() {
        // Known approximation: repeated text resolves to the first hit
        let chunk = chunk("Martin called Martin.", 0, 0);
        let spans = resolve_detections(
            &chunk,
            vec![detection("Martin", "PER", 14, 20)],
            &name_labels(),
            "ner-model",
        );

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 0);
    }

    #[test]
    fn test_placeholder_echo_detection() {
        assert!(is_placeholder_echo("[NAME]"));
        assert!(is_placeholder_echo("name"));
        assert!(is_placeholder_echo("saw [DATE] again"));
        assert!(!is_placeholder_echo("Durand"));
        assert!(!is_placeholder_echo("0612345678"));
    }

    #[test]
    fn test_non_ascii_chunk_offsets_are_character_based() {
        let chunk = chunk("Mme Héloïse était là.", 10, 0);
        let spans = resolve_detections(
            &chunk,
            vec![detection("Héloïse", "PER", 0, 0)],
            &name_labels(),
            "ner-model",
        );

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 14);
        assert_eq!(spans[0].end, 21);
    }
}
