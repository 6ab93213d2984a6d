//! Timeline - budgets, the per-tick pin controller, scrub smoothing.

pub mod budget;
pub mod controller;
pub mod scrub;

pub use budget::{compute_budget, is_degenerate};
pub use controller::{pinned_region, reset_controller_state};
pub use scrub::ScrubDamper;
