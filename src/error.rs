//! Setup-time error taxonomy.
//!
//! All conditions here surface once, at registration. Everything that can
//! go wrong later (degenerate budgets, missing anchors during refresh,
//! repeated mode events) degrades gracefully instead of erroring: this
//! engine drives presentation, and a visitor should see a static layout,
//! never a failure state.

use thiserror::Error;

/// Errors surfaced when wiring a region or marker into the engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    /// No viewport size has been reported yet; the engine cannot compute
    /// budgets or pin windows without one.
    #[error("viewport size is not available yet; call set_viewport_size first")]
    ViewportUnavailable,

    /// The extent provider returned `None` at registration time: the
    /// layout anchor the region hangs off does not exist.
    #[error("content extent provider returned no anchor at registration")]
    MissingAnchor,

    /// A region must contain at least one item.
    #[error("region must contain at least one item")]
    EmptyRegion,
}
