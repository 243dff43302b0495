//! Vector kernel
//!
//! Re-exports the double-precision glam types used throughout the physics
//! code and adds the few helpers glam does not provide: a normalize that
//! reports degenerate input instead of producing NaN, tangent-plane
//! projection, and angle measurement.

pub use glam::{DMat3, DQuat, DVec3};

/// Squared length below which a vector is treated as zero.
pub const DEGENERATE_LENGTH_SQ: f64 = 1e-24;

/// Unit vector used when a direction cannot be derived.
pub const FALLBACK_UP: DVec3 = DVec3::Y;

/// Result of a guarded normalize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    /// Unit-length direction (the fallback when `degenerate` is set)
    pub dir: DVec3,
    /// True when the input was too short (or non-finite) to normalize
    pub degenerate: bool,
}

/// Normalize `v`, falling back to `fallback` when `v` is near zero or not finite.
///
/// The fallback is itself normalized; if it is degenerate too, [`FALLBACK_UP`]
/// is used so the returned direction is always unit length.
pub fn normalize_or(v: DVec3, fallback: DVec3) -> Normalized {
    let len_sq = v.length_squared();
    if len_sq.is_finite() && len_sq > DEGENERATE_LENGTH_SQ {
        return Normalized {
            dir: v / len_sq.sqrt(),
            degenerate: false,
        };
    }

    let fallback_len_sq = fallback.length_squared();
    let dir = if fallback_len_sq.is_finite() && fallback_len_sq > DEGENERATE_LENGTH_SQ {
        fallback / fallback_len_sq.sqrt()
    } else {
        FALLBACK_UP
    };
    Normalized {
        dir,
        degenerate: true,
    }
}

/// Normalize with [`FALLBACK_UP`] as the fallback.
#[inline]
pub fn safe_normalize(v: DVec3) -> Normalized {
    normalize_or(v, FALLBACK_UP)
}

/// Remove the component of `v` along the unit vector `normal`.
#[inline]
pub fn project_on_plane(v: DVec3, normal: DVec3) -> DVec3 {
    v - normal * v.dot(normal)
}

/// Angle in radians between two non-zero vectors (0 when either is degenerate).
pub fn angle_between(a: DVec3, b: DVec3) -> f64 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom <= DEGENERATE_LENGTH_SQ {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// True when every component is finite.
#[inline]
pub fn is_finite(v: DVec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Uniformly rescale `v` so its length does not exceed `max_len`.
pub fn clamp_length(v: DVec3, max_len: f64) -> DVec3 {
    let len_sq = v.length_squared();
    if len_sq > max_len * max_len && len_sq > 0.0 {
        v * (max_len / len_sq.sqrt())
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_regular_vector() {
        let n = safe_normalize(DVec3::new(3.0, 0.0, 4.0));
        assert!(!n.degenerate);
        assert!((n.dir.length() - 1.0).abs() < 1e-12);
        assert!((n.dir.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero_uses_fallback() {
        let n = normalize_or(DVec3::ZERO, DVec3::new(0.0, 0.0, 2.0));
        assert!(n.degenerate);
        assert_eq!(n.dir, DVec3::Z);
    }

    #[test]
    fn test_normalize_nan_never_propagates() {
        let n = safe_normalize(DVec3::new(f64::NAN, 1.0, 0.0));
        assert!(n.degenerate);
        assert!(is_finite(n.dir));
        assert_eq!(n.dir, FALLBACK_UP);
    }

    #[test]
    fn test_degenerate_fallback_defaults_to_up() {
        let n = normalize_or(DVec3::ZERO, DVec3::ZERO);
        assert!(n.degenerate);
        assert_eq!(n.dir, FALLBACK_UP);
    }

    #[test]
    fn test_project_on_plane() {
        let v = DVec3::new(1.0, 2.0, 3.0);
        let p = project_on_plane(v, DVec3::Y);
        assert_eq!(p, DVec3::new(1.0, 0.0, 3.0));
    }

    #[test]
    fn test_angle_between() {
        let a = angle_between(DVec3::X, DVec3::Y);
        assert!((a - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(angle_between(DVec3::ZERO, DVec3::Y), 0.0);
    }

    #[test]
    fn test_clamp_length_preserves_direction() {
        let v = DVec3::new(0.0, 30.0, 40.0);
        let c = clamp_length(v, 5.0);
        assert!((c.length() - 5.0).abs() < 1e-12);
        assert!((c.normalize() - v.normalize()).length() < 1e-12);
        assert_eq!(clamp_length(DVec3::X, 5.0), DVec3::X);
    }
}
