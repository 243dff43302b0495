//! Gravity integrator
//!
//! Direct O(N²) softened gravity with a kick-drift-kick leapfrog stepper.
//!
//! # Force law
//!
//! For every unordered pair `(i, j)`:
//!
//! ```text
//! r        = pos_j - pos_i
//! dist_sq  = |r|² + softening²
//! factor   = G * r / dist_sq^1.5
//! accel_i += factor * mass_j
//! accel_j -= factor * mass_i
//! ```
//!
//! Both contributions come from the same `factor`, so `m_i * a_i` and
//! `m_j * a_j` cancel to rounding and total momentum is conserved. A
//! zero-mass body contributes nothing to the other body (its term is
//! skipped) but still receives acceleration.
//!
//! # Leapfrog (KDK)
//!
//! 1. accelerations at current positions
//! 2. `v += a * dt/2`
//! 3. `x += v * dt`
//! 4. accelerations at new positions
//! 5. `v += a * dt/2`
//!
//! Fixed bodies skip 2, 3 and 5 but still attract everything else.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::vector::clamp_length;
use crate::error::SimError;

/// Live-tunable gravity constants. Passed into every step; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    /// Gravitational constant (unit-agnostic)
    pub g: f64,
    /// Added in quadrature to pair distances to bound near-field acceleration
    pub softening_length: f64,
    /// Optional cap on each body's resultant acceleration magnitude
    pub max_accel: Option<f64>,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            g: 1.0,
            softening_length: 0.5,
            max_accel: None,
        }
    }
}

impl GravityConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.g.is_finite() || self.g < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "G must be finite and >= 0, got {}",
                self.g
            )));
        }
        if !self.softening_length.is_finite() || self.softening_length < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "softening length must be finite and >= 0, got {}",
                self.softening_length
            )));
        }
        if let Some(max) = self.max_accel
            && (!max.is_finite() || max <= 0.0)
        {
            return Err(SimError::InvalidConfig(format!(
                "max acceleration must be finite and > 0, got {max}"
            )));
        }
        Ok(())
    }
}

/// Counters from one force evaluation or step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Pairs skipped because their separation produced a non-finite force
    pub degenerate_pairs: usize,
    /// Bodies whose acceleration was rescaled by `max_accel`
    pub clamped_bodies: usize,
}

impl StepStats {
    pub fn merge(&mut self, other: StepStats) {
        self.degenerate_pairs += other.degenerate_pairs;
        self.clamped_bodies += other.clamped_bodies;
    }
}

/// Acceleration contributions of one pair on each of its members.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairContribution {
    /// Acceleration added to body `i` by body `j`
    pub on_i: DVec3,
    /// Acceleration added to body `j` by body `i`
    pub on_j: DVec3,
}

/// Compute the pair's mutual accelerations.
///
/// Returns `None` when the pair is degenerate (coincident with zero
/// softening, or otherwise non-finite).
pub fn pair_contribution(a: &Body, b: &Body, config: &GravityConfig) -> Option<PairContribution> {
    let r = b.position - a.position;
    let soft_sq = config.softening_length * config.softening_length;
    let dist_sq = r.length_squared() + soft_sq;
    if dist_sq <= 0.0 {
        return None;
    }

    let inv_dist_cubed = 1.0 / (dist_sq * dist_sq.sqrt());
    let factor = r * (config.g * inv_dist_cubed);
    if !factor.is_finite() {
        return None;
    }

    let on_i = if b.mass > 0.0 { factor * b.mass } else { DVec3::ZERO };
    let on_j = if a.mass > 0.0 { -factor * a.mass } else { DVec3::ZERO };
    Some(PairContribution { on_i, on_j })
}

/// Recompute `acceleration` for every body from the current positions.
pub fn compute_accelerations(bodies: &mut [Body], config: &GravityConfig) -> StepStats {
    let mut stats = StepStats::default();
    for body in bodies.iter_mut() {
        body.acceleration = DVec3::ZERO;
    }

    let n = bodies.len();
    for i in 0..n {
        for j in (i + 1)..n {
            if bodies[i].mass <= 0.0 && bodies[j].mass <= 0.0 {
                continue;
            }
            match pair_contribution(&bodies[i], &bodies[j], config) {
                Some(pair) => {
                    bodies[i].acceleration += pair.on_i;
                    bodies[j].acceleration += pair.on_j;
                }
                None => stats.degenerate_pairs += 1,
            }
        }
    }

    for body in bodies.iter_mut() {
        if !body.gravity_coupled {
            body.acceleration = DVec3::ZERO;
            continue;
        }
        if let Some(max) = config.max_accel
            && body.acceleration.length_squared() > max * max
        {
            body.acceleration = clamp_length(body.acceleration, max);
            stats.clamped_bodies += 1;
        }
    }

    if stats.degenerate_pairs > 0 {
        tracing::debug!(pairs = stats.degenerate_pairs, "skipped degenerate gravity pairs");
    }
    stats
}

/// Advance all non-fixed bodies by one kick-drift-kick leapfrog step.
pub fn step_leapfrog(bodies: &mut [Body], dt: f64, config: &GravityConfig) -> StepStats {
    let half_dt = 0.5 * dt;

    let mut stats = compute_accelerations(bodies, config);

    // Kick + drift
    for body in bodies.iter_mut().filter(|b| !b.fixed) {
        body.velocity += body.acceleration * half_dt;
        body.position += body.velocity * dt;
    }

    stats.merge(compute_accelerations(bodies, config));

    // Kick
    for body in bodies.iter_mut().filter(|b| !b.fixed) {
        body.velocity += body.acceleration * half_dt;
    }

    stats
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Total linear momentum `Σ m v`.
pub fn total_momentum(bodies: &[Body]) -> DVec3 {
    bodies.iter().map(Body::momentum).sum()
}

/// Mass-weighted center; `None` when the total mass is zero.
pub fn center_of_mass(bodies: &[Body]) -> Option<DVec3> {
    let total: f64 = bodies.iter().map(|b| b.mass).sum();
    if total <= 0.0 {
        return None;
    }
    let weighted: DVec3 = bodies.iter().map(|b| b.position * b.mass).sum();
    Some(weighted / total)
}

pub fn kinetic_energy(bodies: &[Body]) -> f64 {
    bodies
        .iter()
        .map(|b| 0.5 * b.mass * b.velocity.length_squared())
        .sum()
}

/// Softened pairwise potential energy, consistent with the force law above.
pub fn potential_energy(bodies: &[Body], config: &GravityConfig) -> f64 {
    let soft_sq = config.softening_length * config.softening_length;
    let mut energy = 0.0;
    for (i, a) in bodies.iter().enumerate() {
        for b in &bodies[i + 1..] {
            let dist = (a.position.distance_squared(b.position) + soft_sq).sqrt();
            if dist > 0.0 {
                energy -= config.g * a.mass * b.mass / dist;
            }
        }
    }
    energy
}

pub fn total_energy(bodies: &[Body], config: &GravityConfig) -> f64 {
    kinetic_energy(bodies) + potential_energy(bodies, config)
}

/// Angular momentum `Σ (x - about) × m v`.
pub fn angular_momentum(bodies: &[Body], about: DVec3) -> DVec3 {
    bodies
        .iter()
        .map(|b| (b.position - about).cross(b.momentum()))
        .sum()
}
