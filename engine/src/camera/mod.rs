//! Camera Module
//!
//! Camera state and math only: the look basis, a surface-relative first-person
//! look controller, and ray picking. Rendering and interpolation belong to the
//! renderer.

pub mod fps_controller;
pub mod frame;
pub mod raycast;

pub use fps_controller::FPSCameraController;
pub use frame::CameraFrame;
pub use raycast::{Ray, SphereTarget, nearest_sphere_hit};
