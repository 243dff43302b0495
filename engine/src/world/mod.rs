//! World Module
//!
//! Everything above the physics kernel that makes a playable system:
//! live-tunable configuration, JSON presets, snapshots for the renderer and
//! save files, and the fixed-step [`GravityWorld`] loop.
//!
//! ## Default World
//! A star with two planets on circular orbits and a moon around the inner
//! planet. The player spawns on the inner planet next to a few props.

pub mod config;
pub mod preset;
pub mod scene;
pub mod snapshot;

pub use config::{ConfigPatch, ConfigStore, DEFAULT_FIXED_DT, DEFAULT_MAX_SUBSTEPS, SimConfig};
pub use preset::{PlayerSpawn, PresetBody, PresetOrbit, PresetProp, SurfacePoint, WorldPreset};
pub use scene::{CameraMode, GravityWorld, Placement, SimClock};
pub use snapshot::{
    BodyInstance, BodySnapshot, Diagnostics, SNAPSHOT_VERSION, WorldSnapshot, positions_flat,
};
