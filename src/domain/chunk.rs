//! Offset-tagged text chunks.

use serde::{Deserialize, Serialize};

/// A bounded slice of the original text, tagged with its position.
///
/// Offsets are global character offsets into the original document, so
/// `end_offset - start_offset == text.chars().count()`. Chunks produced
/// by the [`Chunker`](crate::core::Chunker) cover the whole document
/// with no gaps; consecutive chunks may overlap by up to the configured
/// `chunk_overlap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk text handed to detection backends
    pub text: String,

    /// Global character offset of the first character
    pub start_offset: usize,

    /// Global character offset one past the last character
    pub end_offset: usize,

    /// Sequential 0-based chunk index
    pub index: usize,
}

impl Chunk {
    /// Chunk length in characters
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn is_empty(&self) -> bool {
        self.end_offset == self.start_offset
    }
}
