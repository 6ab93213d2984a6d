//! Responsive mode switch.
//!
//! Exactly one of [`ResponsiveMode::Pinned`] / [`ResponsiveMode::Flow`] is
//! current at any time, resolved from viewport width against the single
//! breakpoint. A real transition tears down everything the outgoing mode
//! owned (the pin lock is released with an unpin notification, regions
//! are rested, reveal sets are cleared) before the incoming mode's state
//! is installed. Re-evaluating at the same width is a no-op, so rapid
//! resize event bursts cannot produce duplicate teardown/setup cycles.

use std::cell::RefCell;

use spark_signals::{signal, Signal};

use crate::engine::registry;
use crate::state::subscribe;
use crate::timeline::controller;
use crate::types::ResponsiveMode;

// =============================================================================
// Mode State
// =============================================================================

thread_local! {
    static CURRENT_MODE: Signal<ResponsiveMode> = signal(ResponsiveMode::default());

    /// Mode the last evaluation resolved to. `None` until the first
    /// viewport report; the idempotence check compares against this, not
    /// against the signal, so the first evaluation installs exactly once.
    static RESOLVED: RefCell<Option<ResponsiveMode>> = const { RefCell::new(None) };
}

/// The currently installed responsive mode.
pub fn current_mode() -> ResponsiveMode {
    CURRENT_MODE.with(|m| m.get())
}

/// Mode signal for reactive tracking.
pub fn mode_signal() -> Signal<ResponsiveMode> {
    CURRENT_MODE.with(|m| m.clone())
}

// =============================================================================
// Evaluation
// =============================================================================

/// Re-evaluate the mode for a viewport width.
///
/// Idempotent: if the resolved mode is unchanged nothing happens. On a
/// real change the outgoing mode's state is torn down first, then the new
/// mode is installed and mode-change subscribers are notified.
pub(crate) fn evaluate_for_width(width: f32) {
    let next = ResponsiveMode::for_width(width);
    let previous = RESOLVED.with(|resolved| *resolved.borrow());

    if previous == Some(next) {
        return;
    }

    tracing::debug!(?previous, mode = ?next, width, "responsive mode transition");

    teardown_outgoing();

    RESOLVED.with(|resolved| *resolved.borrow_mut() = Some(next));
    CURRENT_MODE.with(|m| m.set(next));
    subscribe::dispatch_mode_change(next);
}

/// Tear down everything the outgoing mode owned.
///
/// The pin lock is released with a notification (presentation must drop
/// its pinned styling); region progress/index rest silently and reveal
/// sets clear, so the incoming mode starts from a clean slate and the
/// next tick publishes fresh values.
fn teardown_outgoing() {
    if let Some(owner) = controller::pinned_region() {
        controller::force_unpin(owner);
    }
    registry::with_regions_mut(|regions| {
        for region in regions.values_mut() {
            region.rest();
            region.clear_reveals();
        }
    });
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset mode state (for testing).
pub fn reset_mode_state() {
    RESOLVED.with(|resolved| *resolved.borrow_mut() = None);
    CURRENT_MODE.with(|m| m.set(ResponsiveMode::default()));
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn setup() {
        registry::reset_registry();
        subscribe::reset_subscriptions();
        reset_mode_state();
    }

    #[test]
    fn test_breakpoint_selects_mode() {
        setup();

        evaluate_for_width(1440.0);
        assert_eq!(current_mode(), ResponsiveMode::Pinned);

        evaluate_for_width(390.0);
        assert_eq!(current_mode(), ResponsiveMode::Flow);
    }

    #[test]
    fn test_idempotent_at_same_width() {
        setup();

        let transitions = Rc::new(Cell::new(0usize));
        let transitions_clone = transitions.clone();
        let _cleanup = subscribe::on_mode_change(move |_| {
            transitions_clone.set(transitions_clone.get() + 1);
        });

        // Two resize events at the same width: one teardown/setup cycle.
        evaluate_for_width(800.0);
        evaluate_for_width(800.0);
        assert_eq!(transitions.get(), 1);

        // Different width on the same side of the breakpoint: still one.
        evaluate_for_width(900.0);
        assert_eq!(transitions.get(), 1);

        // Crossing the breakpoint: a second cycle.
        evaluate_for_width(1280.0);
        assert_eq!(transitions.get(), 2);
    }

    #[test]
    fn test_first_evaluation_installs_once() {
        setup();

        let transitions = Rc::new(Cell::new(0usize));
        let transitions_clone = transitions.clone();
        let _cleanup = subscribe::on_mode_change(move |_| {
            transitions_clone.set(transitions_clone.get() + 1);
        });

        evaluate_for_width(1280.0);
        assert_eq!(transitions.get(), 1);
        assert_eq!(current_mode(), ResponsiveMode::Pinned);
    }
}
