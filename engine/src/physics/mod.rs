//! Physics module for the gravity-walk engine
//!
//! Custom N-body gravity and contact handling, built from scratch on glam's
//! double-precision types. No external physics library.
//!
//! # Unit System
//!
//! Simulation units are abstract and chosen per world: the gravitational
//! constant, masses and distances come from [`GravityConfig`] and the world
//! preset. Everything is `f64` so orbits stay stable at planetary scales.
//!
//! # Submodules
//!
//! - [`vector`] - DVec3/DQuat re-exports plus degenerate-safe helpers
//! - [`body`] - Body records and registration specs
//! - [`registry`] - Exclusive owner of all bodies, stable ids
//! - [`gravity`] - Pairwise softened gravity, leapfrog integrator, diagnostics
//! - [`orbit`] - Circular orbit seeding and momentum zeroing
//! - [`collision`] - Sphere contacts and grounding

pub mod body;
pub mod collision;
pub mod gravity;
pub mod orbit;
pub mod registry;
pub mod vector;

// Re-export commonly used types at the physics module level
pub use body::{Body, BodyId, BodyKind, BodySpec};
pub use collision::{ContactConfig, ResolveReport, resolve_contacts};
pub use gravity::{GravityConfig, StepStats, compute_accelerations, step_leapfrog};
pub use orbit::{OrbitParams, place_circular_orbit, zero_momentum};
pub use registry::BodyRegistry;
pub use vector::{DQuat, DVec3};
