//! Planning which parts of a request must come from the remote source

use crate::cached::CachedRange;
use crate::range::CellRange;

/// Stateless algorithms over a requested range and the ranges already cached
pub struct RangeOptimizer;

impl RangeOptimizer {
    /// Find the fragments of `requested` that no cached range covers.
    ///
    /// The fragments are disjoint, never overlap a cached range, and together
    /// with the covered cells add up to exactly `requested`. Their shapes
    /// depend on the order of `cached`.
    pub fn find_missing_ranges(requested: &CellRange, cached: &[CachedRange]) -> Vec<CellRange> {
        let mut missing = vec![*requested];

        for entry in cached {
            if !entry.range.overlaps_with(requested) {
                continue;
            }

            missing = missing
                .iter()
                .flat_map(|fragment| fragment.subtract(&entry.range))
                .collect();

            if missing.is_empty() {
                break;
            }
        }

        missing
    }

    /// Find the cached ranges that share at least one cell with `requested`,
    /// most recently cached first.
    ///
    /// Entries with equal `cached_at` keep their input order.
    pub fn find_overlapping_cached_ranges(
        requested: &CellRange,
        cached: &[CachedRange],
    ) -> Vec<CachedRange> {
        let mut overlapping: Vec<CachedRange> = cached
            .iter()
            .filter(|entry| entry.range.overlaps_with(requested))
            .cloned()
            .collect();
        overlapping.sort_by(|a, b| b.cached_at.cmp(&a.cached_at));
        overlapping
    }

    /// Check whether `requested` is fully covered by `cached`
    pub fn can_satisfy_from_cache(requested: &CellRange, cached: &[CachedRange]) -> bool {
        Self::find_missing_ranges(requested, cached).is_empty()
    }
}
