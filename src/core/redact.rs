//! Placeholder rewriting.
//!
//! Replaces merged entity spans in the original text with bracketed
//! category placeholders (`[NAME]`, `[DATE]`, ...). Replacement runs
//! right-to-left on the progressively rewritten text: indices left of
//! the current replacement are never invalidated, so no offset
//! bookkeeping is needed.
//!
//! Callers must pass the merger's output. Overlapping spans are not
//! re-resolved here and produce undefined replacements.

use tracing::{debug, warn};

use crate::domain::EntitySpan;

/// Rewrites text by replacing entity spans with placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Redactor;

impl Redactor {
    /// Replace each span of `text` with `[KIND]`.
    ///
    /// Offsets are character offsets. Inverted or out-of-bounds spans
    /// are skipped with a warning; an empty span list returns the input
    /// unchanged.
    pub fn redact(text: &str, spans: &[EntitySpan]) -> String {
        if spans.is_empty() {
            return text.to_string();
        }

        let mut sorted: Vec<&EntitySpan> = spans.iter().collect();
        sorted.sort_by(|a, b| b.start.cmp(&a.start));

        let mut chars: Vec<char> = text.chars().collect();

        for span in sorted {
            if span.start >= span.end {
                warn!(start = span.start, end = span.end, "Skipping inverted entity span");
                continue;
            }

            if span.end > chars.len() {
                warn!(
                    start = span.start,
                    end = span.end,
                    text_chars = chars.len(),
                    "Skipping out-of-bounds entity span"
                );
                continue;
            }

            let placeholder = format!("[{}]", span.kind.as_str());
            chars.splice(span.start..span.end, placeholder.chars());

            debug!(
                entity = %span.text,
                start = span.start,
                end = span.end,
                placeholder = %placeholder,
                "Replaced entity"
            );
        }

        chars.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityKind;

    fn span(kind: EntityKind, start: usize, end: usize) -> EntitySpan {
        EntitySpan {
            text: String::new(),
            kind,
            score: 0.9,
            start,
            end,
            chunk_index: 0,
            source: "test".to_string(),
        }
    }

    #[test]
    fn test_single_replacement_preserves_surroundings() {
        let out = Redactor::redact(
            "Hello John Doe, age 30.",
            &[span(EntityKind::Name, 6, 14)],
        );
        assert_eq!(out, "Hello [NAME], age 30.");
    }

    #[test]
    fn test_multiple_replacements_right_to_left() {
        // Placeholder lengths differ from span lengths; left spans must
        // still land exactly.
        let out = Redactor::redact(
            "John Doe seen on 12/03/2024 at Lyon.",
            &[
                span(EntityKind::Name, 0, 8),
                span(EntityKind::Date, 17, 27),
                span(EntityKind::Location, 31, 35),
            ],
        );
        assert_eq!(out, "[NAME] seen on [DATE] at [LOCATION].");
    }

    #[test]
    fn test_empty_span_list_is_identity() {
        assert_eq!(Redactor::redact("unchanged", &[]), "unchanged");
        assert_eq!(Redactor::redact("", &[]), "");
    }

    #[test]
    fn test_out_of_bounds_span_skipped() {
        let out = Redactor::redact("short", &[span(EntityKind::Name, 2, 99)]);
        assert_eq!(out, "short");
    }

    #[test]
    fn test_inverted_span_skipped() {
        let out = Redactor::redact("text here", &[span(EntityKind::Name, 5, 5)]);
        assert_eq!(out, "text here");
    }

    #[test]
    fn test_bad_span_does_not_affect_good_ones() {
        let out = Redactor::redact(
            "Hello John Doe, age 30.",
            &[span(EntityKind::Name, 6, 14), span(EntityKind::Date, 40, 50)],
        );
        assert_eq!(out, "Hello [NAME], age 30.");
    }

    #[test]
    fn test_character_offsets_with_non_ascii_text() {
        // "Mme Héloïse" - the name starts at character 4, byte offsets
        // would land elsewhere.
        let out = Redactor::redact(
            "Mme Héloïse hospitalisée.",
            &[span(EntityKind::Name, 4, 11)],
        );
        assert_eq!(out, "Mme [NAME] hospitalisée.");
    }

    #[test]
    fn test_replacement_at_text_edges() {
        let out = Redactor::redact("John", &[span(EntityKind::Name, 0, 4)]);
        assert_eq!(out, "[NAME]");
    }
}
