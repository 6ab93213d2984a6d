//! Pin/timeline controller - the per-tick engine.
//!
//! One scroll tick runs in strict phases:
//!
//! 1. Pure compute: every region's progress is derived from the offset and
//!    stored, then its index, so no subscriber observes a half-updated pair.
//! 2. Pin arbitration: at most one region owns the pin lock; ownership
//!    follows ascending priority, and a transfer unpins the previous owner
//!    before the next acquires.
//! 3. Dispatch: progress handlers, then index handlers, region by region
//!    in priority order.
//! 4. Settled class: marker triggers evaluate last, in both modes.
//!
//! In [`ResponsiveMode::Flow`] no region pins; items reveal independently
//! as their extent slice crosses the reveal line, once per installation.
//!
//! Handler lists are snapshotted before invocation (see
//! [`crate::state::subscribe`]), so the region table is never borrowed
//! while user code runs.

use std::cell::RefCell;

use crate::engine::region::RegionFlags;
use crate::engine::registry;
use crate::mapper::map_progress_to_index;
use crate::state::{mode, subscribe, viewport};
use crate::types::{MarkerId, RegionId, ResponsiveMode, REVEAL_VIEWPORT_FRACTION};

// =============================================================================
// Pin Lock
// =============================================================================

thread_local! {
    /// The one region currently holding the pin lock, if any.
    static PIN_OWNER: RefCell<Option<usize>> = const { RefCell::new(None) };
}

/// Region currently holding the pin lock, if any.
pub fn pinned_region() -> Option<RegionId> {
    PIN_OWNER.with(|owner| owner.borrow().map(RegionId))
}

/// Release the pin lock held by `region`, notifying subscribers.
/// Used by mode teardown; no-op if the region does not hold the lock.
pub(crate) fn force_unpin(region: RegionId) {
    let held = PIN_OWNER.with(|owner| {
        let mut owner = owner.borrow_mut();
        if *owner == Some(region.0) {
            *owner = None;
            true
        } else {
            false
        }
    });
    if !held {
        return;
    }

    tracing::debug!(region = region.0, "force unpin");
    registry::with_regions_mut(|regions| {
        if let Some(r) = regions.get_mut(&region.0) {
            r.flags.remove(RegionFlags::PINNED);
        }
    });
    subscribe::dispatch_pin_change(region, false);
}

/// Drop the lock silently if `region` holds it. Used by teardown, where
/// the region's subscribers are being removed anyway.
pub(crate) fn clear_pin_owner(region: RegionId) {
    PIN_OWNER.with(|owner| {
        let mut owner = owner.borrow_mut();
        if *owner == Some(region.0) {
            *owner = None;
        }
    });
}

/// Reset controller state (for testing).
pub fn reset_controller_state() {
    PIN_OWNER.with(|owner| *owner.borrow_mut() = None);
}

// =============================================================================
// Scroll Tick
// =============================================================================

/// Run one engine tick at the given scroll offset.
pub(crate) fn handle_scroll(offset: f32) {
    match mode::current_mode() {
        ResponsiveMode::Pinned => pinned_tick(offset),
        ResponsiveMode::Flow => flow_tick(offset),
    }
    // Settled class last: marker anchors only make sense once region
    // state for this offset has fully resolved.
    marker_tick(offset);
}

/// One region's computed-but-not-yet-dispatched tick result.
struct TickUpdate {
    id: usize,
    progress: f32,
    publish_progress: bool,
    index: usize,
    index_changed: bool,
}

fn pinned_tick(offset: f32) {
    let order = registry::sorted_region_ids();
    if order.is_empty() {
        return;
    }

    let mut updates: Vec<TickUpdate> = Vec::with_capacity(order.len());
    let mut next_owner: Option<usize> = None;

    registry::with_regions_mut(|regions| {
        for &id in &order {
            let Some(region) = regions.get_mut(&id) else { continue };
            if region.flags.contains(RegionFlags::DEGENERATE) {
                continue;
            }

            // Progress first, index second, both stored before any
            // dispatch below.
            let progress = region.progress_at(offset);
            let in_window = region.window_contains(offset);
            region.flags.set(RegionFlags::IN_WINDOW, in_window);
            region.progress.set(progress);

            let index = map_progress_to_index(
                progress,
                region.config.item_count,
                region.config.index_policy,
            );
            region.active_index.set(index);

            // First in-window region in priority order owns the lock.
            if in_window && next_owner.is_none() {
                next_owner = Some(id);
            }

            // Every tick while in-window; otherwise only on change, so a
            // fast scroll past a region still delivers its boundary value.
            let publish_progress =
                in_window || region.last_published_progress != Some(progress);
            let index_changed = region.last_published_index != Some(index);
            if publish_progress {
                region.last_published_progress = Some(progress);
            }
            if index_changed {
                region.last_published_index = Some(index);
            }

            updates.push(TickUpdate {
                id,
                progress,
                publish_progress,
                index,
                index_changed,
            });
        }
    });

    transfer_pin(next_owner);

    for update in &updates {
        if update.publish_progress {
            subscribe::dispatch_progress(RegionId(update.id), update.progress);
        }
        if update.index_changed {
            subscribe::dispatch_active_index(RegionId(update.id), update.index);
        }
    }
}

/// Move the pin lock to `next_owner`, unpinning the previous owner first.
fn transfer_pin(next_owner: Option<usize>) {
    let previous = PIN_OWNER.with(|owner| *owner.borrow());
    if previous == next_owner {
        return;
    }

    tracing::debug!(?previous, owner = ?next_owner, "pin transfer");

    if let Some(prev) = previous {
        registry::with_regions_mut(|regions| {
            if let Some(region) = regions.get_mut(&prev) {
                region.flags.remove(RegionFlags::PINNED);
            }
        });
        subscribe::dispatch_pin_change(RegionId(prev), false);
    }
    if let Some(next) = next_owner {
        registry::with_regions_mut(|regions| {
            if let Some(region) = regions.get_mut(&next) {
                region.flags.insert(RegionFlags::PINNED);
            }
        });
        subscribe::dispatch_pin_change(RegionId(next), true);
    }

    PIN_OWNER.with(|owner| *owner.borrow_mut() = next_owner);
}

// =============================================================================
// Flow Mode
// =============================================================================

fn flow_tick(offset: f32) {
    let order = registry::sorted_region_ids();
    if order.is_empty() {
        return;
    }

    let reveal_line = offset + viewport::viewport_height() * REVEAL_VIEWPORT_FRACTION;
    let mut reveals: Vec<(usize, usize)> = Vec::new();

    registry::with_regions_mut(|regions| {
        for &id in &order {
            let Some(region) = regions.get_mut(&id) else { continue };
            // Items stack vertically in flow; estimate each item's top as
            // an equal slice of the region's content height.
            let count = region.config.item_count;
            let slice = region.content_height / count as f32;
            for item in 0..count {
                if region.revealed[item] {
                    continue;
                }
                let item_top = region.raw_top + slice * item as f32;
                if item_top < reveal_line {
                    region.revealed[item] = true;
                    reveals.push((id, item));
                }
            }
        }
    });

    for (id, item) in reveals {
        subscribe::dispatch_item_reveal(RegionId(id), item);
    }
}

// =============================================================================
// Marker Tick
// =============================================================================

fn marker_tick(offset: f32) {
    let order = registry::sorted_marker_ids();
    if order.is_empty() {
        return;
    }

    let mut changes: Vec<(usize, bool)> = Vec::new();
    registry::with_markers_mut(|markers| {
        for &id in &order {
            let Some(marker) = markers.get_mut(&id) else { continue };
            let active = marker.window_contains(offset);
            if active != marker.active {
                marker.active = active;
                changes.push((id, active));
            }
        }
    });

    for (id, active) in changes {
        subscribe::dispatch_marker_active(MarkerId(id), active);
    }
}
