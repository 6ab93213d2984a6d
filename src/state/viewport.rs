//! Viewport listener - root scroll/resize signals.
//!
//! Reactive signals for the scroll offset and viewport dimensions. These
//! are the root signals that drive the whole engine: the host pushes every
//! scroll and resize event through [`set_scroll_offset`] and
//! [`set_viewport_size`], and the engine fans the update out to regions.
//!
//! This is a push contract, not a poll: nothing in the engine waits on the
//! viewport. Operations that need a viewport before one was ever reported
//! fail at setup time with `SetupError::ViewportUnavailable`.

use spark_signals::{signal, Signal};

use crate::pipeline::refresh;
use crate::state::mode;
use crate::timeline::controller;

// =============================================================================
// Root Signals
// =============================================================================

thread_local! {
    static SCROLL_OFFSET: Signal<f32> = signal(0.0);
    static VIEWPORT_WIDTH: Signal<f32> = signal(0.0);
    static VIEWPORT_HEIGHT: Signal<f32> = signal(0.0);
}

/// Current scroll offset in document pixels.
pub fn scroll_offset() -> f32 {
    SCROLL_OFFSET.with(|s| s.get())
}

/// Current viewport width.
pub fn viewport_width() -> f32 {
    VIEWPORT_WIDTH.with(|s| s.get())
}

/// Current viewport height.
pub fn viewport_height() -> f32 {
    VIEWPORT_HEIGHT.with(|s| s.get())
}

/// Whether a viewport size has been reported yet.
pub fn viewport_ready() -> bool {
    viewport_width() > 0.0 && viewport_height() > 0.0
}

/// Scroll offset signal for reactive tracking.
pub fn scroll_offset_signal() -> Signal<f32> {
    SCROLL_OFFSET.with(|s| s.clone())
}

/// Viewport width signal for reactive tracking.
pub fn viewport_width_signal() -> Signal<f32> {
    VIEWPORT_WIDTH.with(|s| s.clone())
}

/// Viewport height signal for reactive tracking.
pub fn viewport_height_signal() -> Signal<f32> {
    VIEWPORT_HEIGHT.with(|s| s.clone())
}

// =============================================================================
// Event Entry Points
// =============================================================================

/// Report a scroll event.
///
/// Updates the offset signal and runs one engine tick: progress is
/// recomputed for every region, then indices, then subscriber dispatch.
pub fn set_scroll_offset(offset: f32) {
    SCROLL_OFFSET.with(|s| s.set(offset));
    controller::handle_scroll(offset);
}

/// Report a resize event.
///
/// Updates the dimension signals, re-evaluates the responsive mode, then
/// recalculates every region's budget and pin window (in priority order)
/// and re-ticks at the current offset so published state matches the new
/// geometry.
pub fn set_viewport_size(width: f32, height: f32) {
    tracing::debug!(width, height, "viewport resize");
    VIEWPORT_WIDTH.with(|s| s.set(width));
    VIEWPORT_HEIGHT.with(|s| s.set(height));

    mode::evaluate_for_width(width);
    refresh::refresh_all();
    controller::handle_scroll(scroll_offset());
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset viewport state without touching regions or subscriptions.
pub fn reset_viewport_state() {
    SCROLL_OFFSET.with(|s| s.set(0.0));
    VIEWPORT_WIDTH.with(|s| s.set(0.0));
    VIEWPORT_HEIGHT.with(|s| s.set(0.0));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_ready() {
        reset_viewport_state();
        assert!(!viewport_ready());

        set_viewport_size(1280.0, 720.0);
        assert!(viewport_ready());
        assert_eq!(viewport_width(), 1280.0);
        assert_eq!(viewport_height(), 720.0);
    }

    #[test]
    fn test_scroll_offset_roundtrip() {
        reset_viewport_state();
        set_viewport_size(1280.0, 720.0);

        set_scroll_offset(640.0);
        assert_eq!(scroll_offset(), 640.0);

        set_scroll_offset(0.0);
        assert_eq!(scroll_offset(), 0.0);
    }

    #[test]
    fn test_signals_track_sets() {
        reset_viewport_state();
        let width = viewport_width_signal();

        set_viewport_size(800.0, 600.0);
        assert_eq!(width.get(), 800.0);
    }
}
