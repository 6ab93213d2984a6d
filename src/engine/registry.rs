//! Region registry - explicit ownership of scroll-engine resources.
//!
//! Manages the lifecycle of regions and markers:
//! - Id allocation (monotonic; ids are never reused, so a stale handle can
//!   never alias a region registered later)
//! - A generation signal bumped on every registration change, so deriveds
//!   that iterate regions automatically re-run
//! - Teardown callbacks per id
//! - Setup-time validation (`SetupError`)
//!
//! Registration returns a handle that owns exactly the resources it
//! allocated; teardown is an explicit, idempotent call on that handle.

use std::cell::RefCell;
use std::collections::HashMap;

use spark_signals::{signal, Signal};

use crate::error::SetupError;
use crate::pipeline::refresh;
use crate::state::{subscribe, viewport};
use crate::timeline::controller;
use crate::types::{MarkerConfig, MarkerId, RegionConfig, RegionId};

use super::region::{MarkerTrigger, RegionFlags, ScrollRegion};

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    static REGIONS: RefCell<HashMap<usize, ScrollRegion>> = RefCell::new(HashMap::new());
    static MARKERS: RefCell<HashMap<usize, MarkerTrigger>> = RefCell::new(HashMap::new());

    static NEXT_REGION_ID: RefCell<usize> = const { RefCell::new(0) };
    static NEXT_MARKER_ID: RefCell<usize> = const { RefCell::new(0) };

    /// Bumped on every registration change. Reading it from a derived or
    /// effect creates the dependency that re-runs on add/remove.
    static GENERATION: Signal<u64> = signal(0);

    /// Teardown callbacks registered per region id.
    static TEARDOWN_CALLBACKS: RefCell<HashMap<usize, Vec<Box<dyn FnOnce()>>>> =
        RefCell::new(HashMap::new());
}

// =============================================================================
// Region Registration
// =============================================================================

/// Register a scroll region.
///
/// Validates setup-time conditions (a viewport must have been reported, the
/// anchor must exist, the region must hold at least one item), computes the
/// region's initial geometry through a full priority-ordered refresh, and
/// returns its handle. Progress/index values publish from the next scroll
/// tick.
///
/// # Errors
///
/// * [`SetupError::EmptyRegion`] - `item_count` is zero
/// * [`SetupError::ViewportUnavailable`] - no viewport size reported yet
/// * [`SetupError::MissingAnchor`] - extent provider returned `None`
pub fn register_region(config: RegionConfig) -> Result<RegionId, SetupError> {
    if config.item_count == 0 {
        return Err(SetupError::EmptyRegion);
    }
    if !viewport::viewport_ready() {
        return Err(SetupError::ViewportUnavailable);
    }
    if (config.extent_provider)().is_none() {
        return Err(SetupError::MissingAnchor);
    }

    let id = NEXT_REGION_ID.with(|next| {
        let mut next = next.borrow_mut();
        let id = *next;
        *next += 1;
        id
    });

    tracing::debug!(
        region = id,
        priority = config.priority,
        items = config.item_count,
        "register region"
    );

    REGIONS.with(|regions| {
        regions
            .borrow_mut()
            .insert(id, ScrollRegion::new(RegionId(id), config));
    });
    bump_generation();

    // Settle geometry for every region so the newcomer sees earlier
    // spacers and later regions see the newcomer's.
    refresh::refresh_all();

    Ok(RegionId(id))
}

/// Tear down a region and release everything it owns.
///
/// Idempotent: unknown or already-released ids are a no-op. After this
/// call no progress, index, pin, or reveal events are emitted for the id,
/// even if scrolling continues.
pub fn teardown_region(region: RegionId) {
    let removed = REGIONS.with(|regions| regions.borrow_mut().remove(&region.0));
    let Some(removed) = removed else { return };

    tracing::debug!(region = region.0, "teardown region");

    bump_generation();

    // Release the pin lock if this region held it.
    if removed.flags.contains(RegionFlags::PINNED) {
        controller::clear_pin_owner(region);
    }

    // Run teardown callbacks before subscriptions disappear.
    let callbacks = TEARDOWN_CALLBACKS.with(|map| map.borrow_mut().remove(&region.0));
    if let Some(callbacks) = callbacks {
        for callback in callbacks {
            callback();
        }
    }

    subscribe::cleanup_region(region);

    // Later regions lose this region's spacer.
    refresh::refresh_all();
}

/// Register a callback to run when the region is torn down.
pub fn on_teardown(region: RegionId, callback: impl FnOnce() + 'static) {
    TEARDOWN_CALLBACKS.with(|map| {
        map.borrow_mut()
            .entry(region.0)
            .or_default()
            .push(Box::new(callback));
    });
}

// =============================================================================
// Marker Registration
// =============================================================================

/// Register a marker trigger (the settled class: resolved after all
/// regions, never pins).
///
/// # Errors
///
/// * [`SetupError::ViewportUnavailable`] - no viewport size reported yet
/// * [`SetupError::MissingAnchor`] - extent provider returned `None`
pub fn register_marker(config: MarkerConfig) -> Result<MarkerId, SetupError> {
    if !viewport::viewport_ready() {
        return Err(SetupError::ViewportUnavailable);
    }
    if (config.extent_provider)().is_none() {
        return Err(SetupError::MissingAnchor);
    }

    let id = NEXT_MARKER_ID.with(|next| {
        let mut next = next.borrow_mut();
        let id = *next;
        *next += 1;
        id
    });

    tracing::debug!(marker = id, priority = config.priority, "register marker");

    MARKERS.with(|markers| {
        markers
            .borrow_mut()
            .insert(id, MarkerTrigger::new(MarkerId(id), config));
    });
    bump_generation();

    refresh::refresh_all();

    Ok(MarkerId(id))
}

/// Tear down a marker. Idempotent.
pub fn teardown_marker(marker: MarkerId) {
    let removed = MARKERS.with(|markers| markers.borrow_mut().remove(&marker.0));
    if removed.is_none() {
        return;
    }
    bump_generation();
    subscribe::cleanup_marker(marker);
}

// =============================================================================
// Lookups
// =============================================================================

/// Latest published progress for a region, or `None` if unregistered.
pub fn progress(region: RegionId) -> Option<f32> {
    REGIONS.with(|regions| regions.borrow().get(&region.0).map(|r| r.progress.get()))
}

/// Latest published active index for a region, or `None` if unregistered.
pub fn active_index(region: RegionId) -> Option<usize> {
    REGIONS.with(|regions| {
        regions.borrow().get(&region.0).map(|r| r.active_index.get())
    })
}

/// Progress signal for reactive tracking.
pub fn progress_signal(region: RegionId) -> Option<Signal<f32>> {
    REGIONS.with(|regions| {
        regions.borrow().get(&region.0).map(|r| r.progress.clone())
    })
}

/// Active-index signal for reactive tracking.
pub fn active_index_signal(region: RegionId) -> Option<Signal<usize>> {
    REGIONS.with(|regions| {
        regions.borrow().get(&region.0).map(|r| r.active_index.clone())
    })
}

/// Runtime flags for a region (pin/window/degenerate state).
pub fn region_flags(region: RegionId) -> Option<RegionFlags> {
    REGIONS.with(|regions| regions.borrow().get(&region.0).map(|r| r.flags))
}

/// Whether a region id is currently registered.
///
/// Note: creates a reactive dependency when called from a derived/effect.
pub fn is_registered(region: RegionId) -> bool {
    let _ = registry_generation();
    REGIONS.with(|regions| regions.borrow().contains_key(&region.0))
}

/// Number of live regions.
pub fn region_count() -> usize {
    let _ = registry_generation();
    REGIONS.with(|regions| regions.borrow().len())
}

/// Number of live markers.
pub fn marker_count() -> usize {
    let _ = registry_generation();
    MARKERS.with(|markers| markers.borrow().len())
}

/// Registration generation: bumped on every register/teardown. Read it
/// from a derived/effect to re-run on registration changes.
pub fn registry_generation() -> u64 {
    GENERATION.with(|g| g.get())
}

fn bump_generation() {
    GENERATION.with(|g| g.set(g.get() + 1));
}

/// Whether a marker is currently inside its activation window.
pub fn marker_is_active(marker: MarkerId) -> bool {
    MARKERS.with(|markers| {
        markers
            .borrow()
            .get(&marker.0)
            .map(|m| m.active)
            .unwrap_or(false)
    })
}

// =============================================================================
// Engine-Internal Access
// =============================================================================

/// Region ids in refresh order: ascending (priority, id).
pub(crate) fn sorted_region_ids() -> Vec<usize> {
    REGIONS.with(|regions| {
        let regions = regions.borrow();
        let mut ids: Vec<(i32, usize)> = regions
            .values()
            .map(|r| (r.config.priority, r.id.0))
            .collect();
        ids.sort_unstable();
        ids.into_iter().map(|(_, id)| id).collect()
    })
}

/// Marker ids in refresh order: ascending (priority, id).
pub(crate) fn sorted_marker_ids() -> Vec<usize> {
    MARKERS.with(|markers| {
        let markers = markers.borrow();
        let mut ids: Vec<(i32, usize)> = markers
            .values()
            .map(|m| (m.config.priority, m.id.0))
            .collect();
        ids.sort_unstable();
        ids.into_iter().map(|(_, id)| id).collect()
    })
}

/// Borrow the region table mutably. Engine-internal; callers must not
/// dispatch subscriber callbacks while the borrow is live.
pub(crate) fn with_regions_mut<R>(f: impl FnOnce(&mut HashMap<usize, ScrollRegion>) -> R) -> R {
    REGIONS.with(|regions| f(&mut regions.borrow_mut()))
}

/// Borrow the marker table mutably. Engine-internal.
pub(crate) fn with_markers_mut<R>(f: impl FnOnce(&mut HashMap<usize, MarkerTrigger>) -> R) -> R {
    MARKERS.with(|markers| f(&mut markers.borrow_mut()))
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all registry state (for testing).
pub fn reset_registry() {
    REGIONS.with(|regions| regions.borrow_mut().clear());
    MARKERS.with(|markers| markers.borrow_mut().clear());
    NEXT_REGION_ID.with(|next| *next.borrow_mut() = 0);
    NEXT_MARKER_ID.with(|next| *next.borrow_mut() = 0);
    GENERATION.with(|g| g.set(0));
    TEARDOWN_CALLBACKS.with(|map| map.borrow_mut().clear());
    controller::reset_controller_state();
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::mode;
    use crate::types::ContentExtent;
    use std::cell::Cell;
    use std::rc::Rc;

    fn setup() {
        reset_registry();
        subscribe::reset_subscriptions();
        mode::reset_mode_state();
        viewport::reset_viewport_state();
        viewport::set_viewport_size(1280.0, 800.0);
    }

    fn stepper_config() -> RegionConfig {
        RegionConfig::new(8, Box::new(|| Some(ContentExtent::new(1000.0, 1280.0, 800.0))))
    }

    #[test]
    fn test_register_allocates_monotonic_ids() {
        setup();

        let a = register_region(stepper_config()).unwrap();
        let b = register_region(stepper_config()).unwrap();
        assert_ne!(a, b);
        assert_eq!(region_count(), 2);

        teardown_region(a);
        let c = register_region(stepper_config()).unwrap();

        // Freed ids stay dead: no reuse.
        assert_ne!(c, a);
        assert!(!is_registered(a));
        assert!(is_registered(c));
    }

    #[test]
    fn test_register_requires_viewport() {
        reset_registry();
        subscribe::reset_subscriptions();
        mode::reset_mode_state();
        viewport::reset_viewport_state();

        let err = register_region(stepper_config()).unwrap_err();
        assert_eq!(err, SetupError::ViewportUnavailable);
    }

    #[test]
    fn test_register_requires_anchor() {
        setup();

        let config = RegionConfig::new(4, Box::new(|| None));
        assert_eq!(register_region(config).unwrap_err(), SetupError::MissingAnchor);
    }

    #[test]
    fn test_register_requires_items() {
        setup();

        let config = RegionConfig::new(0, Box::new(|| Some(ContentExtent::default())));
        assert_eq!(register_region(config).unwrap_err(), SetupError::EmptyRegion);
    }

    #[test]
    fn test_teardown_idempotent() {
        setup();

        let id = register_region(stepper_config()).unwrap();
        teardown_region(id);
        teardown_region(id); // Second call is a no-op
        assert_eq!(region_count(), 0);
    }

    #[test]
    fn test_teardown_callback_runs_once() {
        setup();

        let called = Rc::new(Cell::new(0usize));
        let called_clone = called.clone();

        let id = register_region(stepper_config()).unwrap();
        on_teardown(id, move || called_clone.set(called_clone.get() + 1));

        teardown_region(id);
        teardown_region(id);
        assert_eq!(called.get(), 1);
    }

    #[test]
    fn test_sorted_by_priority_then_id() {
        setup();

        let a = register_region(stepper_config().with_priority(2)).unwrap();
        let b = register_region(stepper_config().with_priority(0)).unwrap();
        let c = register_region(stepper_config().with_priority(1)).unwrap();

        assert_eq!(sorted_region_ids(), vec![b.0, c.0, a.0]);
    }

    #[test]
    fn test_generation_bumps_on_registration_changes() {
        setup();
        let start = registry_generation();

        let id = register_region(stepper_config()).unwrap();
        assert_eq!(registry_generation(), start + 1);

        teardown_region(id);
        assert_eq!(registry_generation(), start + 2);

        teardown_region(id); // No-op: generation unchanged
        assert_eq!(registry_generation(), start + 2);
    }

    #[test]
    fn test_marker_lifecycle() {
        setup();

        let marker = register_marker(MarkerConfig::new(Box::new(|| {
            Some(ContentExtent::new(2000.0, 1280.0, 600.0))
        })))
        .unwrap();
        assert_eq!(marker_count(), 1);
        assert!(!marker_is_active(marker));

        teardown_marker(marker);
        teardown_marker(marker);
        assert_eq!(marker_count(), 0);
    }

    #[test]
    fn test_lookups_after_teardown_return_none() {
        setup();

        let id = register_region(stepper_config()).unwrap();
        assert_eq!(progress(id), Some(0.0));
        assert_eq!(active_index(id), Some(0));

        teardown_region(id);
        assert_eq!(progress(id), None);
        assert_eq!(active_index(id), None);
        assert_eq!(region_flags(id), None);
    }
}
