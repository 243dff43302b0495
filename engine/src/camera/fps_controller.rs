//! FPS Camera Controller Module
//!
//! First-person look controller for a player whose "up" changes as they walk
//! around a planet. Mouse movement rotates the camera directly (no button
//! needed, no smoothing), but yaw and pitch are measured relative to the
//! player's current up vector instead of world +Y.
//!
//! A tangent-plane `heading` is carried along as the up vector rotates, so
//! yaw = 0 keeps pointing the same way on the ground while the player walks
//! over the horizon.

use glam::{DQuat, DVec3};

use super::frame::CameraFrame;
use crate::physics::vector::{normalize_or, project_on_plane};

/// Pitch limit constant: -89 degrees in radians
const PITCH_LIMIT_MIN: f64 = -89.0 * std::f64::consts::PI / 180.0;
/// Pitch limit constant: +89 degrees in radians
const PITCH_LIMIT_MAX: f64 = 89.0 * std::f64::consts::PI / 180.0;

/// FPS camera controller.
///
/// ## Usage
/// ```rust,ignore
/// let mut look = FPSCameraController::new();
///
/// look.apply_mouse_delta(mouse_dx, mouse_dy);
/// look.align_to(player_up);
/// let camera = look.frame(eye_position, player_up);
/// ```
#[derive(Clone, Debug)]
pub struct FPSCameraController {
    /// Angle about the up vector (radians), positive turns right
    pub yaw: f64,
    /// Angle above the tangent plane (radians), clamped to pitch limits
    pub pitch: f64,
    /// Mouse sensitivity in radians per pixel (default: 0.002)
    pub sensitivity: f64,
    pitch_limits: (f64, f64),
    /// Reference direction in the tangent plane for yaw = 0
    heading: DVec3,
}

impl Default for FPSCameraController {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            sensitivity: 0.002,
            pitch_limits: (PITCH_LIMIT_MIN, PITCH_LIMIT_MAX),
            heading: DVec3::NEG_Z,
        }
    }
}

impl FPSCameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sensitivity(sensitivity: f64) -> Self {
        Self {
            sensitivity,
            ..Default::default()
        }
    }

    #[inline]
    pub fn heading(&self) -> DVec3 {
        self.heading
    }

    /// Set the pitch angle directly (clamped to limits).
    #[inline]
    pub fn set_pitch(&mut self, pitch: f64) {
        self.pitch = pitch.clamp(self.pitch_limits.0, self.pitch_limits.1);
    }

    /// Apply a raw mouse delta in pixels.
    ///
    /// Positive `dx` looks right, positive `dy` (mouse moved down) looks down.
    pub fn apply_mouse_delta(&mut self, dx: f64, dy: f64) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self.pitch.clamp(self.pitch_limits.0, self.pitch_limits.1);
    }

    /// Re-project the heading onto the tangent plane of `up`.
    ///
    /// Call once per frame with the player's smoothed up vector. When the
    /// heading becomes parallel to `up` an arbitrary tangent is chosen.
    pub fn align_to(&mut self, up: DVec3) {
        let up = normalize_or(up, DVec3::Y).dir;
        let tangent = project_on_plane(self.heading, up);
        self.heading = normalize_or(tangent, up.any_orthonormal_vector()).dir;
    }

    /// Camera basis at `eye` for the current yaw/pitch around `up`.
    pub fn frame(&self, eye: DVec3, up: DVec3) -> CameraFrame {
        let up = normalize_or(up, DVec3::Y).dir;
        let heading = normalize_or(project_on_plane(self.heading, up), up.any_orthonormal_vector()).dir;

        let flat_forward = DQuat::from_axis_angle(up, -self.yaw) * heading;
        let right = normalize_or(flat_forward.cross(up), up.any_orthonormal_vector()).dir;
        let forward = DQuat::from_axis_angle(right, self.pitch) * flat_forward;

        CameraFrame::new(eye, forward, up)
    }

    /// Reset orientation to look along the heading.
    pub fn reset_orientation(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let camera = FPSCameraController::new();
        assert_eq!(camera.yaw, 0.0);
        assert_eq!(camera.pitch, 0.0);
        assert_eq!(camera.sensitivity, 0.002);
        assert_eq!(camera.heading(), DVec3::NEG_Z);
    }

    #[test]
    fn test_apply_mouse_delta() {
        let mut camera = FPSCameraController::new();
        camera.apply_mouse_delta(100.0, 0.0);
        assert!((camera.yaw - 0.2).abs() < 1e-12);
        camera.apply_mouse_delta(0.0, 100.0);
        assert!((camera.pitch + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_pitch_clamping() {
        let mut camera = FPSCameraController::new();
        camera.apply_mouse_delta(0.0, -100000.0);
        assert!((camera.pitch - PITCH_LIMIT_MAX).abs() < 1e-12);
        camera.set_pitch(-10.0);
        assert!((camera.pitch - PITCH_LIMIT_MIN).abs() < 1e-12);
    }

    #[test]
    fn test_frame_on_flat_ground() {
        let mut camera = FPSCameraController::new();
        let frame = camera.frame(DVec3::ZERO, DVec3::Y);
        assert!((frame.forward - DVec3::NEG_Z).length() < 1e-12);
        assert!((frame.right() - DVec3::X).length() < 1e-12);

        // Positive yaw turns right, positive pitch looks up
        camera.yaw = std::f64::consts::FRAC_PI_2;
        assert!((camera.frame(DVec3::ZERO, DVec3::Y).forward - DVec3::X).length() < 1e-12);
        camera.yaw = 0.0;
        camera.pitch = 0.5;
        assert!(camera.frame(DVec3::ZERO, DVec3::Y).forward.y > 0.4);
    }

    #[test]
    fn test_heading_follows_up_vector() {
        let mut camera = FPSCameraController::new();
        // Walk a quarter of the way around a planet: up goes from +Y to +Z
        // while the heading was -Z. Heading must stay tangent.
        for i in 0..=90 {
            let angle = (i as f64).to_radians();
            let up = DVec3::new(0.0, angle.cos(), angle.sin());
            camera.align_to(up);
            assert!(camera.heading().dot(up).abs() < 1e-9);
            assert!((camera.heading().length() - 1.0).abs() < 1e-9);
        }
        assert!((camera.heading() - DVec3::Y).length() < 1e-6);
    }
}
