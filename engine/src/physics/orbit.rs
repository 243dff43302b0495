//! Orbit initializer
//!
//! Seeds satellites onto circular orbits and removes net system momentum so
//! the barycenter stays (approximately) put over long sessions.
//!
//! The orbital plane starts as XZ (`x = cos(phase) * r`, `z = sin(phase) * r`)
//! and is tilted by the inclination about the X axis, which acts as the line
//! of nodes. The tangential direction is the phase derivative of the position
//! rotated the same way, so it always lies in the inclined plane.

use std::f64::consts::TAU;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId};
use super::registry::BodyRegistry;
use crate::error::SimError;

/// Satellite/primary mass ratio below which the light-satellite speed is used.
pub const LIGHT_SATELLITE_RATIO: f64 = 1e-3;

/// Circular orbit parameters (angles in radians).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitParams {
    pub radius: f64,
    #[serde(default)]
    pub phase: f64,
    #[serde(default)]
    pub inclination: f64,
}

impl OrbitParams {
    pub fn new(radius: f64, phase: f64, inclination: f64) -> Self {
        Self {
            radius,
            phase,
            inclination,
        }
    }
}

/// Offset from the primary and unit tangential direction for an orbit.
pub fn orbital_frame(radius: f64, phase: f64, inclination: f64) -> (DVec3, DVec3) {
    let (sin_p, cos_p) = phase.sin_cos();
    let (sin_i, cos_i) = inclination.sin_cos();

    // Rotate (x, 0, z) about X: y' = -z sin i, z' = z cos i
    let offset = DVec3::new(cos_p * radius, -sin_p * radius * sin_i, sin_p * radius * cos_i);
    let tangent = DVec3::new(-sin_p, -cos_p * sin_i, cos_p * cos_i).normalize();
    (offset, tangent)
}

/// Speed of a circular orbit of `radius` around `primary`.
///
/// A fixed primary cannot recoil, so it always gets the light-satellite form
/// `sqrt(G M / r)`. Otherwise a heavy satellite uses the reduced two-body form
/// `sqrt(G M² / ((M + m) r))`.
pub fn circular_speed(g: f64, primary: &Body, satellite_mass: f64, radius: f64) -> f64 {
    let light = primary.fixed
        || primary.mass <= 0.0
        || satellite_mass / primary.mass < LIGHT_SATELLITE_RATIO;
    if light {
        (g * primary.mass / radius).sqrt()
    } else {
        (g * primary.mass * primary.mass / ((primary.mass + satellite_mass) * radius)).sqrt()
    }
}

/// Period of a circular orbit of a light satellite.
pub fn orbital_period(g: f64, primary_mass: f64, radius: f64) -> f64 {
    TAU * (radius * radius * radius / (g * primary_mass)).sqrt()
}

/// Place `satellite` on a circular orbit around `primary`.
///
/// The satellite inherits the primary's current velocity, so parents must be
/// placed before their children when chaining orbits.
pub fn place_circular_orbit(
    primary: &Body,
    satellite: &mut Body,
    radius: f64,
    phase: f64,
    inclination: f64,
    g: f64,
) -> Result<(), SimError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(SimError::InvalidSpec(format!(
            "orbit radius for '{}' must be > 0, got {radius}",
            satellite.name
        )));
    }
    if !primary.mass.is_finite() || primary.mass <= 0.0 {
        return Err(SimError::InvalidSpec(format!(
            "primary '{}' needs positive mass to hold an orbit",
            primary.name
        )));
    }
    if !g.is_finite() || g < 0.0 || !phase.is_finite() || !inclination.is_finite() {
        return Err(SimError::InvalidSpec(format!(
            "orbit of '{}' has non-finite parameters",
            satellite.name
        )));
    }

    let (offset, tangent) = orbital_frame(radius, phase, inclination);
    let speed = circular_speed(g, primary, satellite.mass, radius);

    satellite.position = primary.position + offset;
    satellite.velocity = primary.velocity + tangent * speed;
    Ok(())
}

/// Registry-level variant of [`place_circular_orbit`].
pub fn place_orbit(
    registry: &mut BodyRegistry,
    primary: BodyId,
    satellite: BodyId,
    params: &OrbitParams,
    g: f64,
) -> Result<(), SimError> {
    let primary = registry.body(primary)?.clone();
    let satellite = registry.body_mut(satellite)?;
    place_circular_orbit(
        &primary,
        satellite,
        params.radius,
        params.phase,
        params.inclination,
        g,
    )
}

/// Cancel net momentum by adjusting the most massive body's velocity.
///
/// Returns the adjusted body, or `None` when there is nothing to adjust
/// (empty system, zero mass, or a fixed reference body).
pub fn zero_momentum(bodies: &mut [Body]) -> Option<BodyId> {
    let total: DVec3 = bodies.iter().map(Body::momentum).sum();
    let reference = bodies
        .iter_mut()
        .max_by(|a, b| a.mass.total_cmp(&b.mass))?;

    if reference.fixed || reference.mass <= 0.0 {
        return None;
    }
    reference.velocity -= total / reference.mass;
    Some(reference.id)
}
