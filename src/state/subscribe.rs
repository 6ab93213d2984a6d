//! Subscription registries - the engine's push contract.
//!
//! The presentation layer subscribes per region (or marker) and receives
//! values the engine computed; the engine never reaches into presentation
//! state. Every subscription returns a cleanup closure.
//!
//! Dispatch snapshots the handler list before invoking it, so a handler is
//! free to unsubscribe or tear down its own region mid-dispatch without
//! re-entrant borrow failures.
//!
//! # Example
//!
//! ```ignore
//! use spark_scroll::state::subscribe;
//!
//! let cleanup = subscribe::on_progress(region, |progress| {
//!     println!("progress: {progress}");
//! });
//!
//! // ... scroll happens ...
//! cleanup();
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::{MarkerId, RegionId, ResponsiveMode};

// =============================================================================
// Handler Registry
// =============================================================================

type ProgressHandler = Rc<dyn Fn(f32)>;
type IndexHandler = Rc<dyn Fn(usize)>;
type PinHandler = Rc<dyn Fn(bool)>;
type RevealHandler = Rc<dyn Fn(usize)>;
type MarkerHandler = Rc<dyn Fn(bool)>;
type ModeHandler = Rc<dyn Fn(ResponsiveMode)>;

#[derive(Default)]
struct SubscriberRegistry {
    progress: HashMap<RegionId, Vec<(usize, ProgressHandler)>>,
    index: HashMap<RegionId, Vec<(usize, IndexHandler)>>,
    pin: HashMap<RegionId, Vec<(usize, PinHandler)>>,
    reveal: HashMap<RegionId, Vec<(usize, RevealHandler)>>,
    marker: HashMap<MarkerId, Vec<(usize, MarkerHandler)>>,
    mode: Vec<(usize, ModeHandler)>,
    next_id: usize,
}

impl SubscriberRegistry {
    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

thread_local! {
    static REGISTRY: RefCell<SubscriberRegistry> = RefCell::new(SubscriberRegistry::default());
}

// =============================================================================
// Region Subscriptions
// =============================================================================

/// Subscribe to progress updates for a region.
///
/// Pushed on every scroll tick while the region is inside its pin window,
/// and once whenever the clamped value changes outside it. Returns a
/// cleanup function.
pub fn on_progress<F>(region: RegionId, handler: F) -> impl FnOnce()
where
    F: Fn(f32) + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.progress.entry(region).or_default().push((id, Rc::new(handler)));
        id
    });
    move || {
        REGISTRY.with(|reg| {
            let mut reg = reg.borrow_mut();
            if let Some(handlers) = reg.progress.get_mut(&region) {
                handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        });
    }
}

/// Subscribe to active-index changes for a region.
///
/// Pushed only when the computed index changes, never on every tick.
/// Returns a cleanup function.
pub fn on_active_index<F>(region: RegionId, handler: F) -> impl FnOnce()
where
    F: Fn(usize) + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.index.entry(region).or_default().push((id, Rc::new(handler)));
        id
    });
    move || {
        REGISTRY.with(|reg| {
            let mut reg = reg.borrow_mut();
            if let Some(handlers) = reg.index.get_mut(&region) {
                handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        });
    }
}

/// Subscribe to pin/unpin transitions for a region.
///
/// `true` when the region acquires the pin lock, `false` when it releases
/// it. Unpin for the previous owner always fires before pin for the next.
pub fn on_pin_change<F>(region: RegionId, handler: F) -> impl FnOnce()
where
    F: Fn(bool) + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.pin.entry(region).or_default().push((id, Rc::new(handler)));
        id
    });
    move || {
        REGISTRY.with(|reg| {
            let mut reg = reg.borrow_mut();
            if let Some(handlers) = reg.pin.get_mut(&region) {
                handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        });
    }
}

/// Subscribe to flow-mode item reveals for a region.
///
/// Each item index is pushed at most once per mode installation, when its
/// extent slice crosses the reveal line.
pub fn on_item_reveal<F>(region: RegionId, handler: F) -> impl FnOnce()
where
    F: Fn(usize) + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.reveal.entry(region).or_default().push((id, Rc::new(handler)));
        id
    });
    move || {
        REGISTRY.with(|reg| {
            let mut reg = reg.borrow_mut();
            if let Some(handlers) = reg.reveal.get_mut(&region) {
                handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        });
    }
}

// =============================================================================
// Marker / Mode Subscriptions
// =============================================================================

/// Subscribe to activation changes for a marker trigger.
pub fn on_marker_active<F>(marker: MarkerId, handler: F) -> impl FnOnce()
where
    F: Fn(bool) + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.marker.entry(marker).or_default().push((id, Rc::new(handler)));
        id
    });
    move || {
        REGISTRY.with(|reg| {
            let mut reg = reg.borrow_mut();
            if let Some(handlers) = reg.marker.get_mut(&marker) {
                handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        });
    }
}

/// Subscribe to responsive mode transitions.
///
/// Fires once per real transition; repeated resize events at the same
/// width do not re-fire.
pub fn on_mode_change<F>(handler: F) -> impl FnOnce()
where
    F: Fn(ResponsiveMode) + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.mode.push((id, Rc::new(handler)));
        id
    });
    move || {
        REGISTRY.with(|reg| {
            let mut reg = reg.borrow_mut();
            reg.mode.retain(|(handler_id, _)| *handler_id != id);
        });
    }
}

// =============================================================================
// Dispatch (engine-internal)
// =============================================================================

fn snapshot_region_handlers<H: Clone>(
    map: &HashMap<RegionId, Vec<(usize, H)>>,
    region: RegionId,
) -> Vec<H> {
    map.get(&region)
        .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
        .unwrap_or_default()
}

pub(crate) fn dispatch_progress(region: RegionId, progress: f32) {
    let handlers = REGISTRY.with(|reg| snapshot_region_handlers(&reg.borrow().progress, region));
    for handler in handlers {
        handler(progress);
    }
}

pub(crate) fn dispatch_active_index(region: RegionId, index: usize) {
    let handlers = REGISTRY.with(|reg| snapshot_region_handlers(&reg.borrow().index, region));
    for handler in handlers {
        handler(index);
    }
}

pub(crate) fn dispatch_pin_change(region: RegionId, pinned: bool) {
    let handlers = REGISTRY.with(|reg| snapshot_region_handlers(&reg.borrow().pin, region));
    for handler in handlers {
        handler(pinned);
    }
}

pub(crate) fn dispatch_item_reveal(region: RegionId, item: usize) {
    let handlers = REGISTRY.with(|reg| snapshot_region_handlers(&reg.borrow().reveal, region));
    for handler in handlers {
        handler(item);
    }
}

pub(crate) fn dispatch_marker_active(marker: MarkerId, active: bool) {
    let handlers = REGISTRY.with(|reg| {
        let reg = reg.borrow();
        reg.marker
            .get(&marker)
            .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect::<Vec<_>>())
            .unwrap_or_default()
    });
    for handler in handlers {
        handler(active);
    }
}

pub(crate) fn dispatch_mode_change(mode: ResponsiveMode) {
    let handlers = REGISTRY.with(|reg| {
        reg.borrow().mode.iter().map(|(_, h)| h.clone()).collect::<Vec<_>>()
    });
    for handler in handlers {
        handler(mode);
    }
}

// =============================================================================
// Cleanup (engine-internal)
// =============================================================================

/// Drop every subscription attached to a region. Called by teardown.
pub(crate) fn cleanup_region(region: RegionId) {
    REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        reg.progress.remove(&region);
        reg.index.remove(&region);
        reg.pin.remove(&region);
        reg.reveal.remove(&region);
    });
}

/// Drop every subscription attached to a marker. Called by teardown.
pub(crate) fn cleanup_marker(marker: MarkerId) {
    REGISTRY.with(|reg| {
        reg.borrow_mut().marker.remove(&marker);
    });
}

/// Reset all subscription state (for testing).
pub fn reset_subscriptions() {
    REGISTRY.with(|reg| {
        *reg.borrow_mut() = SubscriberRegistry::default();
    });
}

// =============================================================================
// Tests
// =============================================================================
