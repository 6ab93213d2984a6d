//! Region and marker runtime state.
//!
//! A [`ScrollRegion`] is one pinned, scroll-hijacked section: its host
//! configuration plus the geometry the refresh pass computed for it and
//! the reactive state the controller publishes from it. A
//! [`MarkerTrigger`] is the lighter settled-class trigger with only an
//! activation window.

use bitflags::bitflags;
use spark_signals::{signal, Signal};

use crate::types::{MarkerConfig, MarkerId, RegionConfig, RegionId};

bitflags! {
    /// Packed runtime flags for a region.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RegionFlags: u8 {
        /// Region currently owns the pin lock.
        const PINNED = 1 << 0;
        /// Budget resolved to zero or negative; region is a no-pin
        /// pass-through until a refresh revives it.
        const DEGENERATE = 1 << 1;
        /// Scroll offset was inside the pin window on the last tick.
        const IN_WINDOW = 1 << 2;
    }
}

// =============================================================================
// Scroll Region
// =============================================================================

/// One scroll-hijacked section and everything it owns.
pub struct ScrollRegion {
    pub(crate) id: RegionId,
    pub(crate) config: RegionConfig,

    // Geometry, recomputed by every refresh pass.
    pub(crate) raw_top: f32,
    pub(crate) content_width: f32,
    pub(crate) content_height: f32,
    /// Pin start in scroll space, including earlier regions' spacers.
    pub(crate) start_offset: f32,
    pub(crate) distance_budget: f32,
    pub(crate) flags: RegionFlags,

    // Published reactive state.
    pub(crate) progress: Signal<f32>,
    pub(crate) active_index: Signal<usize>,
    pub(crate) last_published_progress: Option<f32>,
    pub(crate) last_published_index: Option<usize>,

    /// Flow-mode reveal bookkeeping, one flag per item.
    pub(crate) revealed: Vec<bool>,
}

impl ScrollRegion {
    pub(crate) fn new(id: RegionId, config: RegionConfig) -> Self {
        let item_count = config.item_count;
        Self {
            id,
            config,
            raw_top: 0.0,
            content_width: 0.0,
            content_height: 0.0,
            start_offset: 0.0,
            distance_budget: 0.0,
            flags: RegionFlags::DEGENERATE,
            progress: signal(0.0),
            active_index: signal(0),
            last_published_progress: None,
            last_published_index: None,
            revealed: vec![false; item_count],
        }
    }

    /// Progress at a scroll offset. Pure in the offset: the same offset
    /// always reproduces the same value, forward or backward.
    pub(crate) fn progress_at(&self, offset: f32) -> f32 {
        if self.flags.contains(RegionFlags::DEGENERATE) {
            return 0.0;
        }
        ((offset - self.start_offset) / self.distance_budget).clamp(0.0, 1.0)
    }

    /// Whether an offset falls inside the pin window.
    pub(crate) fn window_contains(&self, offset: f32) -> bool {
        !self.flags.contains(RegionFlags::DEGENERATE)
            && offset >= self.start_offset
            && offset < self.start_offset + self.distance_budget
    }

    /// Rest the region: progress and index back to zero, publish
    /// bookkeeping cleared, pin/window flags dropped. Used on mode
    /// transitions; emits nothing.
    pub(crate) fn rest(&mut self) {
        self.progress.set(0.0);
        self.active_index.set(0);
        self.last_published_progress = None;
        self.last_published_index = None;
        self.flags.remove(RegionFlags::PINNED | RegionFlags::IN_WINDOW);
    }

    /// Forget flow-mode reveals so the next installation starts fresh.
    pub(crate) fn clear_reveals(&mut self) {
        self.revealed.iter_mut().for_each(|seen| *seen = false);
    }
}

// =============================================================================
// Marker Trigger
// =============================================================================

/// A settled-class trigger: activation window only, never pins.
pub struct MarkerTrigger {
    pub(crate) id: MarkerId,
    pub(crate) config: MarkerConfig,

    pub(crate) raw_top: f32,
    pub(crate) raw_bottom: f32,
    /// Activation window in scroll space, spacers included.
    pub(crate) window_start: f32,
    pub(crate) window_end: f32,
    pub(crate) active: bool,
}

impl MarkerTrigger {
    pub(crate) fn new(id: MarkerId, config: MarkerConfig) -> Self {
        Self {
            id,
            config,
            raw_top: 0.0,
            raw_bottom: 0.0,
            window_start: 0.0,
            window_end: 0.0,
            active: false,
        }
    }

    pub(crate) fn window_contains(&self, offset: f32) -> bool {
        offset >= self.window_start && offset < self.window_end
    }
}

// =============================================================================
// Tests
// =============================================================================
