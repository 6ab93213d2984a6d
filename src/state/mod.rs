//! Engine state - viewport signals, responsive mode, subscriptions.

pub mod mode;
pub mod subscribe;
pub mod viewport;

pub use mode::{current_mode, mode_signal, reset_mode_state};
pub use subscribe::{
    on_active_index, on_item_reveal, on_marker_active, on_mode_change, on_pin_change,
    on_progress, reset_subscriptions,
};
pub use viewport::{
    reset_viewport_state, scroll_offset, scroll_offset_signal, set_scroll_offset,
    set_viewport_size, viewport_height, viewport_height_signal, viewport_ready,
    viewport_width, viewport_width_signal,
};
