//! Core types for spark-scroll.
//!
//! These types define the vocabulary the engine speaks: responsive modes,
//! index-mapping policies, budget policies, and the configuration records
//! hosts hand to the registry. Everything else in the crate consumes them.

// =============================================================================
// Responsive Mode
// =============================================================================

/// Viewport width at which the engine switches between behaviors.
///
/// At or above the breakpoint sections pin and hijack scroll; below it
/// content stays in normal flow and items reveal independently.
pub const DESKTOP_BREAKPOINT: f32 = 1024.0;

/// Fraction of the viewport height an item must cross before it reveals
/// in [`ResponsiveMode::Flow`].
pub const REVEAL_VIEWPORT_FRACTION: f32 = 0.85;

/// Fraction of the viewport height at which marker triggers activate.
///
/// A marker becomes active when its anchor top crosses this line, which
/// keeps highlighting stable while an earlier pinned section is still
/// consuming scroll above it.
pub const MARKER_VIEWPORT_FRACTION: f32 = 0.6;

/// Behavioral variant selected by viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponsiveMode {
    /// Scroll-hijacking behavior: regions pin and advance their content
    /// through a shared active index while consuming their scroll budget.
    #[default]
    Pinned,
    /// Normal document flow: no pinning, no shared index; each item
    /// reveals once as it enters the viewport.
    Flow,
}

impl ResponsiveMode {
    /// Resolve the mode for a viewport width.
    pub fn for_width(width: f32) -> Self {
        if width >= DESKTOP_BREAKPOINT {
            Self::Pinned
        } else {
            Self::Flow
        }
    }
}

// =============================================================================
// Index Policy
// =============================================================================

/// How a region converts continuous progress into a discrete index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPolicy {
    /// Even segments of width `1/(item_count - 1)`, rounded to the nearest
    /// boundary (half rounds up). Used by steppers that swap content
    /// instantly between adjacent items.
    RoundNearest,
    /// Equal-width buckets of `1/item_count`, floored. `progress == 1.0`
    /// lands in the last bucket. Used by carousels that slide continuously.
    FloorBucket,
}

// =============================================================================
// Budget Policy
// =============================================================================

/// How a region derives its scroll-distance budget.
///
/// Both variants are monotonic in their content inputs: more items or a
/// wider track always means a larger budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BudgetPolicy {
    /// Budget proportional to viewport height and item count:
    /// `viewport_height * item_count * factor`.
    PerItemViewport {
        /// Scroll effort per item, in viewport heights.
        factor: f32,
    },
    /// Budget proportional to how far the track overflows the viewport:
    /// `(content_width - viewport_width * visible_fraction) * duration_multiplier`.
    ///
    /// Degenerates to no pin when the content fits without overflow.
    ContentOverflow {
        /// Fraction of the viewport width the track occupies on screen.
        visible_fraction: f32,
        /// Stretches the scroll distance relative to the traversed width.
        duration_multiplier: f32,
    },
}

impl BudgetPolicy {
    /// Stepper default: 0.8 viewport heights of scroll per item.
    pub fn per_item() -> Self {
        Self::PerItemViewport { factor: 0.8 }
    }

    /// Carousel default: 60% visible track, 1.5x scroll duration.
    pub fn content_overflow() -> Self {
        Self::ContentOverflow {
            visible_fraction: 0.6,
            duration_multiplier: 1.5,
        }
    }
}

// =============================================================================
// Content Extent
// =============================================================================

/// Snapshot of a region's place in the document, reported by the host.
///
/// Positions are raw document pixels, *without* any pin-spacer the engine
/// itself inserts; spacer arithmetic is the engine's job.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContentExtent {
    /// Document offset of the region's top edge.
    pub top: f32,
    /// Scrollable content width (the full track, not the visible part).
    pub width: f32,
    /// Content height.
    pub height: f32,
}

impl ContentExtent {
    pub fn new(top: f32, width: f32, height: f32) -> Self {
        Self { top, width, height }
    }
}

/// Callback into the host returning the current content extent.
///
/// Returning `None` means the anchor is missing; at registration time that
/// is a setup error, at refresh time the region keeps its last geometry.
/// Called while the engine holds its region table, so providers must be
/// pure measurement functions and not call back into the engine.
pub type ExtentProvider = Box<dyn Fn() -> Option<ContentExtent>>;

// =============================================================================
// Region Configuration
// =============================================================================

/// Setup-time description of one scroll region.
pub struct RegionConfig {
    /// Number of discrete steps/cards inside the region. Must be >= 1.
    pub item_count: usize,
    /// Refresh order; lower values resolve first. Should match document
    /// order so later regions see earlier pin-spacers.
    pub priority: i32,
    /// Progress-to-index conversion policy.
    pub index_policy: IndexPolicy,
    /// Scroll-distance budget derivation.
    pub budget_policy: BudgetPolicy,
    /// Pixels below the viewport top at which pinning begins. Zero pins
    /// when the anchor reaches the top edge.
    pub start_viewport_offset: f32,
    /// Host callback for the region's document geometry.
    pub extent_provider: ExtentProvider,
}

impl RegionConfig {
    /// Config with stepper defaults: round-nearest index mapping and a
    /// per-item viewport budget.
    pub fn new(item_count: usize, extent_provider: ExtentProvider) -> Self {
        Self {
            item_count,
            priority: 0,
            index_policy: IndexPolicy::RoundNearest,
            budget_policy: BudgetPolicy::per_item(),
            start_viewport_offset: 0.0,
            extent_provider,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_index_policy(mut self, policy: IndexPolicy) -> Self {
        self.index_policy = policy;
        self
    }

    pub fn with_budget_policy(mut self, policy: BudgetPolicy) -> Self {
        self.budget_policy = policy;
        self
    }

    pub fn with_start_viewport_offset(mut self, offset: f32) -> Self {
        self.start_viewport_offset = offset;
        self
    }
}

// =============================================================================
// Marker Configuration
// =============================================================================

/// Setup-time description of a marker trigger.
///
/// Markers are the settled class: their windows are computed only after
/// every region's pin-spacer is accounted for, and they never pin.
pub struct MarkerConfig {
    /// Order among markers; lower values resolve first.
    pub priority: i32,
    /// Fraction of the viewport height at which the marker activates.
    pub viewport_fraction: f32,
    /// Host callback for the marked section's document geometry.
    pub extent_provider: ExtentProvider,
}

impl MarkerConfig {
    pub fn new(extent_provider: ExtentProvider) -> Self {
        Self {
            priority: 0,
            viewport_fraction: MARKER_VIEWPORT_FRACTION,
            extent_provider,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_viewport_fraction(mut self, fraction: f32) -> Self {
        self.viewport_fraction = fraction;
        self
    }
}

// =============================================================================
// Handles
// =============================================================================

/// Handle for a registered scroll region.
///
/// Ids are never reused: a torn-down id stays dead so stale handles can
/// never observe a later region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub(crate) usize);

/// Handle for a registered marker trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub(crate) usize);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_for_width() {
        assert_eq!(ResponsiveMode::for_width(1440.0), ResponsiveMode::Pinned);
        assert_eq!(ResponsiveMode::for_width(1024.0), ResponsiveMode::Pinned);
        assert_eq!(ResponsiveMode::for_width(1023.9), ResponsiveMode::Flow);
        assert_eq!(ResponsiveMode::for_width(390.0), ResponsiveMode::Flow);
    }

    #[test]
    fn test_config_builders() {
        let config = RegionConfig::new(8, Box::new(|| Some(ContentExtent::new(100.0, 800.0, 600.0))))
            .with_priority(2)
            .with_index_policy(IndexPolicy::FloorBucket)
            .with_budget_policy(BudgetPolicy::content_overflow())
            .with_start_viewport_offset(80.0);

        assert_eq!(config.item_count, 8);
        assert_eq!(config.priority, 2);
        assert_eq!(config.index_policy, IndexPolicy::FloorBucket);
        assert_eq!(config.start_viewport_offset, 80.0);
        assert!((config.extent_provider)().is_some());
    }

    #[test]
    fn test_marker_defaults() {
        let config = MarkerConfig::new(Box::new(|| None));
        assert_eq!(config.priority, 0);
        assert!((config.viewport_fraction - MARKER_VIEWPORT_FRACTION).abs() < f32::EPSILON);
    }
}
