//! Camera frame
//!
//! The orthonormal basis the renderer places the camera with and the
//! controller reads movement directions from. `right = forward × up`, so
//! the default frame looks down -Z with +X to the right (OpenGL/Vulkan
//! convention).

use glam::{DMat3, DQuat, DVec3};

use super::raycast::Ray;
use crate::physics::vector::{normalize_or, project_on_plane};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub position: DVec3,
    /// Unit look direction
    pub forward: DVec3,
    /// Unit up, orthogonal to `forward`
    pub up: DVec3,
}

impl Default for CameraFrame {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            forward: DVec3::NEG_Z,
            up: DVec3::Y,
        }
    }
}

impl CameraFrame {
    /// Build an orthonormal frame.
    ///
    /// `up` is re-orthogonalized against `forward`; degenerate inputs fall back
    /// to the default axes rather than producing NaN.
    pub fn new(position: DVec3, forward: DVec3, up: DVec3) -> Self {
        let forward = normalize_or(forward, DVec3::NEG_Z).dir;
        let up = normalize_or(
            project_on_plane(up, forward),
            forward.any_orthonormal_vector(),
        )
        .dir;
        Self {
            position,
            forward,
            up,
        }
    }

    /// Frame looking from `position` toward `target`.
    pub fn look_at(position: DVec3, target: DVec3, up: DVec3) -> Self {
        Self::new(position, target - position, up)
    }

    #[inline]
    pub fn right(&self) -> DVec3 {
        self.forward.cross(self.up)
    }

    /// Ray from the camera through the screen center.
    pub fn center_ray(&self) -> Ray {
        Ray {
            origin: self.position,
            direction: self.forward,
        }
    }

    /// Point `distance` units straight ahead.
    #[inline]
    pub fn point_ahead(&self, distance: f64) -> DVec3 {
        self.position + self.forward * distance
    }

    /// Rotation taking the default frame (-Z forward, +Y up) to this one.
    pub fn orientation(&self) -> DQuat {
        DQuat::from_mat3(&DMat3::from_cols(self.right(), self.up, -self.forward)).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orthonormalizes() {
        let frame = CameraFrame::new(DVec3::ZERO, DVec3::new(0.0, 0.0, -2.0), DVec3::new(0.0, 1.0, 1.0));
        assert!((frame.forward - DVec3::NEG_Z).length() < 1e-12);
        assert!((frame.up - DVec3::Y).length() < 1e-12);
        assert!((frame.right() - DVec3::X).length() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs_stay_finite() {
        let frame = CameraFrame::new(DVec3::ZERO, DVec3::ZERO, DVec3::ZERO);
        assert!(frame.forward.is_finite() && frame.up.is_finite());
        assert!((frame.up.length() - 1.0).abs() < 1e-12);
        assert!(frame.up.dot(frame.forward).abs() < 1e-12);

        let parallel = CameraFrame::new(DVec3::ZERO, DVec3::Y, DVec3::Y);
        assert!(parallel.up.dot(parallel.forward).abs() < 1e-12);
    }

    #[test]
    fn test_orientation_maps_default_axes() {
        let frame = CameraFrame::look_at(DVec3::ZERO, DVec3::X, DVec3::Y);
        let q = frame.orientation();
        assert!((q * DVec3::NEG_Z - frame.forward).length() < 1e-9);
        assert!((q * DVec3::Y - frame.up).length() < 1e-9);
    }

    #[test]
    fn test_point_ahead() {
        let frame = CameraFrame::new(DVec3::new(1.0, 2.0, 3.0), DVec3::X, DVec3::Y);
        assert_eq!(frame.point_ahead(3.0), DVec3::new(4.0, 2.0, 3.0));
        assert_eq!(frame.center_ray().direction, DVec3::X);
    }
}
