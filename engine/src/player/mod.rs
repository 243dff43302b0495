//! Player Module
//!
//! Player-side systems layered on the body registry.
//!
//! # Components
//!
//! - [`PlayerMovementController`] - Walking/Flying state machine with
//!   surface-relative "up", coyote-time jumps and camera-relative movement
//! - [`GrabSubsystem`] - Spring-held prop pick-up, carry and throw

pub mod grab;
pub mod movement_controller;

pub use grab::{GrabConfig, GrabConstraint, GrabSubsystem};
pub use movement_controller::{
    MovementConfig, MovementMode, PlayerMovementController, nearest_surface,
};
