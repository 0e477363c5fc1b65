//! Entity span types.
//!
//! An `EntitySpan` is a typed, scored interval of the original text with
//! global character offsets (exclusive end). Spans are produced by
//! detection adapters, consumed read-only by the merger, and finally
//! replaced by the redactor.

use serde::{Deserialize, Serialize};

/// Shared entity taxonomy.
///
/// Every adapter maps its native label set onto this enum before spans
/// leave it, so the merger and redactor never see raw backend labels.
/// Unmapped labels fall back to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Name,
    Date,
    Address,
    Location,
    Phone,
    Email,
    Id,
    Organization,
    Misc,
    Other,
}

impl EntityKind {
    /// Placeholder label used in redacted output (`[NAME]`, `[DATE]`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Name => "NAME",
            EntityKind::Date => "DATE",
            EntityKind::Address => "ADDRESS",
            EntityKind::Location => "LOCATION",
            EntityKind::Phone => "PHONE",
            EntityKind::Email => "EMAIL",
            EntityKind::Id => "ID",
            EntityKind::Organization => "ORGANIZATION",
            EntityKind::Misc => "MISC",
            EntityKind::Other => "OTHER",
        }
    }

    /// All taxonomy labels, used to recognize placeholder echoes when
    /// reprocessing already redacted text.
    pub fn labels() -> &'static [&'static str] {
        &[
            "NAME",
            "DATE",
            "ADDRESS",
            "LOCATION",
            "PHONE",
            "EMAIL",
            "ID",
            "ORGANIZATION",
            "MISC",
            "OTHER",
        ]
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected entity with global character offsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySpan {
    /// The matched text as located in the original document
    pub text: String,

    /// Normalized entity category
    #[serde(rename = "type")]
    pub kind: EntityKind,

    /// Backend confidence in [0, 1]
    pub score: f64,

    /// Global character offset of the first character
    pub start: usize,

    /// Global character offset one past the last character
    pub end: usize,

    /// Index of the chunk this span was detected in (provenance only)
    #[serde(skip)]
    pub chunk_index: usize,

    /// Name of the backend that produced this span
    #[serde(rename = "model")]
    pub source: String,
}

impl EntitySpan {
    /// Span length in characters
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True iff the two spans share at least one character position
    pub fn overlaps(&self, other: &EntitySpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True iff `other` lies entirely within `self`
    pub fn contains(&self, other: &EntitySpan) -> bool {
        self.start <= other.start && self.end >= other.end
    }
}
