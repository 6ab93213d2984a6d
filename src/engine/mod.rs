//! Engine core - region registry and region state.

pub mod region;
pub mod registry;

pub use region::{MarkerTrigger, RegionFlags, ScrollRegion};
pub use registry::{
    active_index, active_index_signal, is_registered, marker_count, marker_is_active,
    on_teardown, progress, progress_signal, region_count, region_flags, register_marker,
    register_region, registry_generation, reset_registry, teardown_marker, teardown_region,
};
