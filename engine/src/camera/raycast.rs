//! Raycast Module
//!
//! Rays from the camera into the world, used for prop picking. Everything is
//! sphere-based since every body in the simulation is a sphere.

use glam::DVec3;

use crate::physics::vector::{is_finite, safe_normalize};

/// A half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    /// Build a ray, normalizing `direction`.
    ///
    /// Returns `None` for a zero-length or non-finite direction, since such a
    /// ray cannot pick anything.
    pub fn new(origin: DVec3, direction: DVec3) -> Option<Self> {
        if !is_finite(origin) || !is_finite(direction) {
            return None;
        }
        let dir = safe_normalize(direction);
        if dir.degenerate {
            return None;
        }
        Some(Self {
            origin,
            direction: dir.dir,
        })
    }

    #[inline]
    pub fn point_at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }

    /// Parameter of the closest point on the ray to `point` (clamped to the
    /// ray's start) and the perpendicular distance at that point.
    pub fn closest_approach(&self, point: DVec3) -> (f64, f64) {
        let t = (point - self.origin).dot(self.direction).max(0.0);
        (t, self.point_at(t).distance(point))
    }
}

/// A candidate sphere for [`nearest_sphere_hit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereTarget<K> {
    pub key: K,
    pub center: DVec3,
    pub radius: f64,
}

/// Nearest sphere whose center lies within `max_distance` along the ray and
/// whose surface (inflated by `tolerance`) the ray passes through.
///
/// Returns the key and the distance along the ray to the sphere's center.
pub fn nearest_sphere_hit<K, I>(
    ray: &Ray,
    targets: I,
    max_distance: f64,
    tolerance: f64,
) -> Option<(K, f64)>
where
    I: IntoIterator<Item = SphereTarget<K>>,
{
    targets
        .into_iter()
        .filter_map(|target| {
            let (t, miss) = ray.closest_approach(target.center);
            let along = (target.center - ray.origin).dot(ray.direction);
            if along < 0.0 || t > max_distance || miss > target.radius + tolerance {
                None
            } else {
                Some((target.key, t))
            }
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
