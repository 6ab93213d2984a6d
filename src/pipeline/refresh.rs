//! Global layout recalculation.
//!
//! One refresh pass settles every region's geometry in ascending
//! `(priority, id)` order, accumulating each pinned region's budget as a
//! virtual pin-spacer: a region's start offset includes the budgets of
//! every region resolved before it, which is exactly why priority must
//! match document order: a later section computed first would read
//! spacer-free layout that the earlier section is about to invalidate.
//!
//! Marker triggers are the settled class: their windows are computed only
//! after every region's spacer is known, shifted by the spacers of all
//! regions anchored above them.
//!
//! Hosts report *raw* (spacer-free) document positions; all spacer
//! arithmetic lives here.

use crate::engine::region::RegionFlags;
use crate::engine::registry;
use crate::state::{mode, viewport};
use crate::timeline::budget;
use crate::types::{ContentExtent, RegionId, ResponsiveMode};

/// Recalculate every region and marker.
///
/// Visits regions in ascending `(priority, id)` order and returns the ids
/// in the order visited. No-ops (returning empty) until a viewport has
/// been reported.
pub fn refresh_all() -> Vec<RegionId> {
    if !viewport::viewport_ready() {
        return Vec::new();
    }

    let vw = viewport::viewport_width();
    let vh = viewport::viewport_height();
    // Pin-spacers only exist while pinning behavior is installed.
    let pinning = mode::current_mode() == ResponsiveMode::Pinned;

    let order = registry::sorted_region_ids();
    tracing::debug!(regions = order.len(), pinning, "refresh pass");

    // Spacers inserted so far: (raw anchor top, budget).
    let mut spacers: Vec<(f32, f32)> = Vec::new();
    let mut accumulated = 0.0f32;

    registry::with_regions_mut(|regions| {
        for &id in &order {
            let Some(region) = regions.get_mut(&id) else { continue };

            // A missing anchor at refresh time keeps the last geometry;
            // only registration treats it as an error.
            if let Some(extent) = (region.config.extent_provider)() {
                region.raw_top = extent.top;
                region.content_width = extent.width;
                region.content_height = extent.height;
            }

            let extent = ContentExtent::new(
                region.raw_top,
                region.content_width,
                region.content_height,
            );
            let raw_budget = budget::compute_budget(
                region.config.budget_policy,
                region.config.item_count,
                extent,
                vw,
                vh,
            );

            region.start_offset =
                region.raw_top - region.config.start_viewport_offset + accumulated;

            if budget::is_degenerate(raw_budget) {
                region.flags.insert(RegionFlags::DEGENERATE);
                region.distance_budget = 0.0;
                tracing::trace!(region = id, "degenerate budget, no pin");
            } else {
                region.flags.remove(RegionFlags::DEGENERATE);
                region.distance_budget = raw_budget;
                if pinning {
                    accumulated += raw_budget;
                    spacers.push((region.raw_top, raw_budget));
                }
                tracing::trace!(
                    region = id,
                    start = region.start_offset,
                    budget = raw_budget,
                    "region window"
                );
            }
        }
    });

    refresh_markers(&spacers, vh);

    order.into_iter().map(RegionId).collect()
}

/// Settle marker windows against the final spacer layout.
fn refresh_markers(spacers: &[(f32, f32)], viewport_height: f32) {
    let order = registry::sorted_marker_ids();
    if order.is_empty() {
        return;
    }

    registry::with_markers_mut(|markers| {
        for &id in &order {
            let Some(marker) = markers.get_mut(&id) else { continue };

            if let Some(extent) = (marker.config.extent_provider)() {
                marker.raw_top = extent.top;
                marker.raw_bottom = extent.top + extent.height;
            }

            // Every spacer anchored above the marker pushes it down.
            let shift: f32 = spacers
                .iter()
                .filter(|(top, _)| *top <= marker.raw_top)
                .map(|(_, budget)| budget)
                .sum();

            let line = viewport_height * marker.config.viewport_fraction;
            marker.window_start = marker.raw_top + shift - line;
            marker.window_end = marker.raw_bottom + shift - line;
        }
    });
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::subscribe;
    use crate::types::{BudgetPolicy, MarkerConfig, RegionConfig};

    fn setup() {
        registry::reset_registry();
        subscribe::reset_subscriptions();
        mode::reset_mode_state();
        viewport::reset_viewport_state();
        viewport::set_viewport_size(1280.0, 800.0);
    }

    fn region_at(top: f32, priority: i32) -> RegionConfig {
        RegionConfig::new(
            4,
            Box::new(move || Some(ContentExtent::new(top, 1280.0, 800.0))),
        )
        .with_priority(priority)
        .with_budget_policy(BudgetPolicy::PerItemViewport { factor: 0.5 })
    }

    #[test]
    fn test_visits_ascending_priority() {
        setup();

        // Registered with priorities [2, 0, 1]; visit order must be
        // ascending priority regardless of registration order.
        let p2 = registry::register_region(region_at(1000.0, 2)).unwrap();
        let p0 = registry::register_region(region_at(3000.0, 0)).unwrap();
        let p1 = registry::register_region(region_at(5000.0, 1)).unwrap();

        assert_eq!(refresh_all(), vec![p0, p1, p2]);
    }

    #[test]
    fn test_spacer_accumulation_shifts_later_regions() {
        setup();

        // Two stacked regions, each with budget 800 * 4 * 0.5 = 1600.
        let first = registry::register_region(region_at(1000.0, 0)).unwrap();
        let second = registry::register_region(region_at(3000.0, 1)).unwrap();
        refresh_all();

        let start_of = |id: RegionId| {
            registry::with_regions_mut(|regions| regions.get(&id.0).map(|r| r.start_offset).unwrap())
        };

        // First region starts at its raw anchor; the second is pushed
        // down by the first's spacer.
        assert_eq!(start_of(first), 1000.0);
        assert_eq!(start_of(second), 3000.0 + 1600.0);
    }

    #[test]
    fn test_no_spacers_in_flow_mode() {
        setup();
        viewport::set_viewport_size(390.0, 800.0); // Flow

        let first = registry::register_region(region_at(1000.0, 0)).unwrap();
        let second = registry::register_region(region_at(3000.0, 1)).unwrap();
        refresh_all();

        let start_of = |id: RegionId| {
            registry::with_regions_mut(|regions| regions.get(&id.0).map(|r| r.start_offset).unwrap())
        };

        assert_eq!(start_of(first), 1000.0);
        assert_eq!(start_of(second), 3000.0);
    }

    #[test]
    fn test_start_viewport_offset_moves_window_up() {
        setup();

        let id = registry::register_region(
            region_at(1000.0, 0).with_start_viewport_offset(80.0),
        )
        .unwrap();
        refresh_all();

        let start = registry::with_regions_mut(|regions| regions.get(&id.0).unwrap().start_offset);
        assert_eq!(start, 920.0);
    }

    #[test]
    fn test_degenerate_budget_flags_region() {
        setup();

        // Track fits inside the visible fraction: no overflow to traverse.
        let id = registry::register_region(
            RegionConfig::new(
                3,
                Box::new(|| Some(ContentExtent::new(1000.0, 500.0, 600.0))),
            )
            .with_budget_policy(BudgetPolicy::content_overflow()),
        )
        .unwrap();
        refresh_all();

        let flags = registry::region_flags(id).unwrap();
        assert!(flags.contains(RegionFlags::DEGENERATE));
    }

    #[test]
    fn test_resize_can_revive_degenerate_region() {
        setup();

        let id = registry::register_region(
            RegionConfig::new(
                3,
                Box::new(|| Some(ContentExtent::new(1000.0, 1000.0, 600.0))),
            )
            .with_budget_policy(BudgetPolicy::content_overflow()),
        )
        .unwrap();

        // Overflow of 1000 - 768 = 232px: pins normally.
        assert!(!registry::region_flags(id).unwrap().contains(RegionFlags::DEGENERATE));

        // Widen the viewport until the track fits: degenerate.
        viewport::set_viewport_size(2000.0, 800.0);
        assert!(registry::region_flags(id).unwrap().contains(RegionFlags::DEGENERATE));

        // Shrink again: revived.
        viewport::set_viewport_size(1280.0, 800.0);
        assert!(!registry::region_flags(id).unwrap().contains(RegionFlags::DEGENERATE));
    }

    #[test]
    fn test_marker_window_reflects_spacers() {
        setup();

        // A region above the marker inserts a 1600px spacer.
        registry::register_region(region_at(1000.0, 0)).unwrap();
        let marker = registry::register_marker(MarkerConfig::new(Box::new(|| {
            Some(ContentExtent::new(4000.0, 1280.0, 600.0))
        })))
        .unwrap();
        refresh_all();

        let (start, end) = registry::with_markers_mut(|markers| {
            let m = markers.get(&marker.0).unwrap();
            (m.window_start, m.window_end)
        });

        // Shifted top 5600, activation line 800 * 0.6 = 480.
        assert_eq!(start, 4000.0 + 1600.0 - 480.0);
        assert_eq!(end, 4600.0 + 1600.0 - 480.0);
    }

    #[test]
    fn test_marker_above_region_unshifted() {
        setup();

        registry::register_region(region_at(5000.0, 0)).unwrap();
        let marker = registry::register_marker(MarkerConfig::new(Box::new(|| {
            Some(ContentExtent::new(1000.0, 1280.0, 600.0))
        })))
        .unwrap();
        refresh_all();

        let start = registry::with_markers_mut(|markers| markers.get(&marker.0).unwrap().window_start);
        assert_eq!(start, 1000.0 - 480.0);
    }

    #[test]
    fn test_refresh_without_viewport_is_noop() {
        registry::reset_registry();
        subscribe::reset_subscriptions();
        mode::reset_mode_state();
        viewport::reset_viewport_state();

        assert!(refresh_all().is_empty());
    }
}
