//! Gravwalk Engine Library
//!
//! Core of a "walk on planets" experience: an N-body gravity simulation where
//! the player stands on one of several mutually-attracting bodies, can switch
//! to free flight, and can grab and throw small props.
//!
//! Rendering, windowing, and raw input wiring live outside this crate. The
//! renderer reads [`world::GravityWorld::get_snapshot`] once per frame; input
//! handling calls the movement, flight and grab entry points.
//!
//! # Modules
//!
//! - [`physics`] - Vector kernel, body registry, leapfrog integrator, orbits, contacts
//! - [`camera`] - Camera frames and ray picking
//! - [`input`] - Platform-agnostic movement input
//! - [`player`] - Surface-relative movement controller and grab subsystem
//! - [`world`] - Configuration, presets, snapshots and the fixed-step world loop
//!
//! # Example
//!
//! ```ignore
//! use gravwalk_engine::world::{GravityWorld, WorldPreset};
//! use gravwalk_engine::input::MovementInput;
//!
//! let mut world = GravityWorld::from_preset(&WorldPreset::default_system()?)?;
//!
//! // Each render frame:
//! world.movement_input(MovementInput { forward: 1.0, ..Default::default() });
//! world.step(frame_dt);
//! for body in world.get_snapshot() {
//!     // place mesh for body.id at body.position
//! }
//! ```

pub mod camera;
pub mod error;
pub mod input;
pub mod physics;
pub mod player;
pub mod world;

pub use error::SimError;
pub use physics::{Body, BodyId, BodyKind, BodyRegistry, BodySpec, GravityConfig};
pub use player::{GrabSubsystem, MovementMode, PlayerMovementController};
pub use world::{GravityWorld, SimConfig, WorldPreset};
