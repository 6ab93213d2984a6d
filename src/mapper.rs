//! Progress-to-index mapping.
//!
//! Pure conversion from a normalized progress value to a discrete item
//! index. Two policies exist because the two pinned sections behave
//! differently on screen: the stepper swaps content at segment midpoints,
//! the carousel slides through equal-width buckets.

use crate::types::IndexPolicy;

/// Map normalized progress in `[0, 1]` to an index in `[0, item_count - 1]`.
///
/// Deterministic and total: out-of-range progress is clamped first, and
/// `item_count <= 1` always yields 0 for either policy.
///
/// - [`IndexPolicy::RoundNearest`]: segment width is `1/(item_count - 1)`;
///   the index is the nearest segment boundary, half-way rounding up.
///   Computed as `round(progress * (item_count - 1))`, which is the same
///   function as `round(progress / segment)` but exact at half-way points.
/// - [`IndexPolicy::FloorBucket`]: `floor(progress * item_count)`, clamped
///   so `progress == 1.0` lands in the last bucket.
pub fn map_progress_to_index(progress: f32, item_count: usize, policy: IndexPolicy) -> usize {
    if item_count <= 1 {
        return 0;
    }

    let progress = progress.clamp(0.0, 1.0);
    let last = item_count - 1;

    let index = match policy {
        IndexPolicy::RoundNearest => (progress * last as f32).round() as usize,
        IndexPolicy::FloorBucket => (progress * item_count as f32).floor() as usize,
    };

    index.min(last)
}

// =============================================================================
// Tests
// =============================================================================
