//! Multi-source entity merging.
//!
//! Detection backends disagree: the same entity is reported by several
//! models, re-detected in overlapping chunks, or split differently at
//! the boundaries. The merger reconciles all of that into a single
//! ordered, pairwise non-overlapping span set.
//!
//! Conflict resolution is a deliberate greedy policy, not weighted
//! interval scheduling: longer spans win, score breaks length ties.
//! A globally optimal cover would change observable output, so the
//! greedy variant is kept.

use tracing::info;

use crate::domain::EntitySpan;

/// Merges entity spans from all chunks and backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityMerger;

impl EntityMerger {
    /// Filter spans by confidence and resolve every overlap.
    ///
    /// The output is sorted by start offset, pairwise disjoint, and
    /// deterministic regardless of the input order.
    pub fn merge(spans: &[EntitySpan], confidence_threshold: f64) -> Vec<EntitySpan> {
        let mut sorted: Vec<EntitySpan> = spans
            .iter()
            .filter(|s| s.score >= confidence_threshold)
            .cloned()
            .collect();

        if sorted.is_empty() {
            return Vec::new();
        }

        // Longer spans sort first at equal start, biasing resolution
        // toward maximal entities.
        sorted.sort_by(|a, b| a.start.cmp(&b.start).then(b.len().cmp(&a.len())));

        let mut skip = vec![false; sorted.len()];
        let mut merged: Vec<EntitySpan> = Vec::new();

        for i in 0..sorted.len() {
            if skip[i] {
                continue;
            }

            // Collect every later, still-live span overlapping the anchor
            let conflicting: Vec<usize> = (i + 1..sorted.len())
                .filter(|&j| !skip[j] && sorted[i].overlaps(&sorted[j]))
                .collect();

            if conflicting.is_empty() {
                merged.push(sorted[i].clone());
                continue;
            }

            // Pick a single winner from the conflict group: longest span
            // first, higher score on a length tie. The anchor wins exact
            // ties because it sorts first.
            let anchor_len = sorted[i].len();
            let mut best = i;

            for &j in &conflicting {
                let other_len = sorted[j].len();
                if other_len > anchor_len
                    || (other_len == anchor_len && sorted[j].score > sorted[best].score)
                {
                    best = j;
                }
            }

            skip[i] = true;
            for &j in &conflicting {
                skip[j] = true;
            }
            skip[best] = false;

            // A winner other than the anchor stays live and is re-checked
            // against even-later spans when its own turn comes.
            if best == i {
                merged.push(sorted[i].clone());
            }
        }

        merged.sort_by_key(|s| s.start);

        info!(
            input = spans.len(),
            merged = merged.len(),
            "Merged entity spans"
        );

        merged
    }
}
