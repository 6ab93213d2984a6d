//! # spark-scroll
//!
//! Reactive scroll progress engine for pinned-section pages.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! fine-grained reactivity.
//!
//! ## Architecture
//!
//! The host pushes scroll and resize events in; the engine computes pin
//! windows, normalized progress, and discrete active indices per registered
//! region, and pushes them back out through subscription handles. The engine
//! never touches presentation state.
//!
//! ```text
//! set_scroll_offset ──► controller tick ──► progress ──► active index ──► subscribers
//! set_viewport_size ──► mode switch ──► refresh (priority order) ──► re-tick
//! ```
//!
//! Every registration returns a handle that owns exactly the resources it
//! allocated; every subscription returns a cleanup closure; teardown is an
//! explicit, idempotent call.
//!
//! ## Modules
//!
//! - [`types`] - Core vocabulary (modes, policies, configs, handles)
//! - [`mapper`] - Pure progress-to-index mapping
//! - [`engine`] - Region/marker registry and runtime state
//! - [`state`] - Viewport signals, responsive mode, subscriptions
//! - [`timeline`] - Budgets, the per-tick pin controller, scrub smoothing
//! - [`pipeline`] - Priority-ordered recalculation
//!
//! ## Example
//!
//! ```ignore
//! use spark_scroll::{RegionConfig, ContentExtent, IndexPolicy};
//! use spark_scroll::{register_region, on_active_index, set_viewport_size, set_scroll_offset};
//!
//! set_viewport_size(1280.0, 800.0);
//!
//! let stepper = register_region(
//!     RegionConfig::new(8, Box::new(|| Some(ContentExtent::new(1000.0, 1280.0, 800.0))))
//!         .with_start_viewport_offset(80.0),
//! )?;
//!
//! let cleanup = on_active_index(stepper, |step| {
//!     println!("active step: {step}");
//! });
//!
//! set_scroll_offset(2500.0); // host scroll event
//! # Ok::<(), spark_scroll::SetupError>(())
//! ```

pub mod engine;
pub mod error;
pub mod mapper;
pub mod pipeline;
pub mod state;
pub mod timeline;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::SetupError;

pub use mapper::map_progress_to_index;

pub use engine::{
    active_index, active_index_signal, is_registered, marker_count, marker_is_active,
    on_teardown, progress, progress_signal, region_count, region_flags, register_marker,
    register_region, registry_generation, reset_registry, teardown_marker, teardown_region,
    RegionFlags,
};

pub use state::{
    current_mode, mode_signal, on_active_index, on_item_reveal, on_marker_active,
    on_mode_change, on_pin_change, on_progress, reset_mode_state, reset_subscriptions,
    reset_viewport_state, scroll_offset, scroll_offset_signal, set_scroll_offset,
    set_viewport_size, viewport_height, viewport_height_signal, viewport_ready,
    viewport_width, viewport_width_signal,
};

pub use timeline::{compute_budget, is_degenerate, pinned_region, ScrubDamper};

pub use pipeline::refresh_all;

/// Reset every piece of engine state (for testing).
///
/// Clears regions, markers, subscriptions, the pin lock, the resolved
/// responsive mode, and the viewport signals.
pub fn reset_scroll_engine() {
    engine::reset_registry();
    state::reset_subscriptions();
    state::reset_mode_state();
    state::reset_viewport_state();
}

// =============================================================================
// Integration Tests
// =============================================================================
