//! Position-aware text chunking.
//!
//! Splits a document into bounded windows for the detection backends
//! while tracking each window's global character offsets, so that
//! chunk-local detections can be mapped back onto the original text.
//! Cuts prefer sentence boundaries to avoid slicing entities in half.

use tracing::debug;

use crate::config::PipelineConfig;
use crate::domain::Chunk;

/// How far around the tentative cut point to look for a sentence break,
/// in characters on each side.
const SENTENCE_SEARCH_WINDOW: usize = 100;

/// Splits text into overlapping, offset-tagged chunks.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Build a chunker from a validated configuration.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    /// Split `text` into chunks covering `[0, len)` with no gaps.
    ///
    /// All offsets are character offsets. Empty input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let text_length = chars.len();

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut current_pos = 0;

        while current_pos < text_length {
            let mut end_pos = (current_pos + self.chunk_size).min(text_length);

            // Prefer ending the chunk at a sentence boundary near the cut
            if end_pos < text_length {
                let search_start = current_pos.max(end_pos.saturating_sub(SENTENCE_SEARCH_WINDOW));
                let search_end = (end_pos + SENTENCE_SEARCH_WINDOW).min(text_length);

                if let Some(boundary) = last_sentence_break(&chars[search_start..search_end]) {
                    end_pos = search_start + boundary;
                }
            }

            chunks.push(Chunk {
                text: chars[current_pos..end_pos].iter().collect(),
                start_offset: current_pos,
                end_offset: end_pos,
                index: chunks.len(),
            });

            // Step forward, keeping the configured overlap. If the step
            // would not strictly advance past the chunk we just emitted,
            // drop the overlap for this step so the loop terminates.
            let next_pos = end_pos.saturating_sub(self.chunk_overlap);
            current_pos = if next_pos <= chunks[chunks.len() - 1].start_offset {
                end_pos
            } else {
                next_pos
            };
        }

        debug!(
            chunks = chunks.len(),
            text_chars = text_length,
            "Split text into chunks"
        );

        chunks
    }
}

/// Find the position just past the last sentence terminator followed by
/// whitespace (`. `, `! `, `? `, including the full trailing whitespace
/// run) in `window`. Returns an offset relative to the window start.
fn last_sentence_break(window: &[char]) -> Option<usize> {
    let mut last = None;
    let mut i = 0;

    while i < window.len() {
        if matches!(window[i], '.' | '!' | '?') {
            let mut j = i + 1;
            while j < window.len() && window[j].is_whitespace() {
                j += 1;
            }
            if j > i + 1 {
                last = Some(j);
                i = j;
                continue;
            }
        }
        i += 1;
    }

    last
}
