//! Collision & grounding resolver
//!
//! Sphere-vs-sphere contact between dynamic bodies (player, props) and
//! massive bodies (planets, moons, stars), plus "standing on a surface"
//! detection.
//!
//! Runs after the integrator, before the next render sync. For every dynamic
//! body against every massive body:
//!
//! ```text
//! normal      = normalize(pos - massive_pos)
//! penetration = (radius_self + radius_other) - distance
//! ```
//!
//! An overlapping pair pushes the lighter member out along the normal and
//! reflects the inward normal component of its velocity (relative to the other
//! body, so contacts against an orbiting planet behave the same as against a
//! resting one) with restitution. A body is grounded against a massive body
//! when its surface gap is within `ground_epsilon` and its normal speed
//! relative to that body is within `grounded_speed`.
//!
//! # Example
//!
//! ```ignore
//! use gravwalk_engine::physics::collision::{resolve_contacts, ContactConfig};
//!
//! let report = resolve_contacts(registry.bodies_mut(), &ContactConfig::default(), &[]);
//! if report.is_grounded(player_id) {
//!     // allow jumping
//! }
//! ```

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId, BodyKind};
use crate::error::SimError;

/// Separations shorter than this cannot produce a contact normal.
const MIN_CONTACT_DISTANCE: f64 = 1e-9;

/// Contact response tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Fraction of inward normal speed returned as outward speed (0..=1)
    pub restitution: f64,
    /// Fraction of tangential speed removed per impact (0..=1). Not applied
    /// to the player, whose tangential motion belongs to the controller.
    pub friction: f64,
    /// Surface gap under which a body counts as standing on a surface
    pub ground_epsilon: f64,
    /// Largest relative normal speed that still counts as resting
    pub grounded_speed: f64,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            restitution: 0.2,
            friction: 0.1,
            ground_epsilon: 1.5,
            grounded_speed: 1.0,
        }
    }
}

impl ContactConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(SimError::InvalidConfig(format!(
                "restitution must be within [0, 1], got {}",
                self.restitution
            )));
        }
        if !(0.0..=1.0).contains(&self.friction) {
            return Err(SimError::InvalidConfig(format!(
                "friction must be within [0, 1], got {}",
                self.friction
            )));
        }
        if !self.ground_epsilon.is_finite() || self.ground_epsilon < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "ground epsilon must be finite and >= 0, got {}",
                self.ground_epsilon
            )));
        }
        if !self.grounded_speed.is_finite() || self.grounded_speed < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "grounded speed must be finite and >= 0, got {}",
                self.grounded_speed
            )));
        }
        Ok(())
    }
}

/// Pure contact computation for one dynamic sphere against one massive sphere.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactResult {
    /// Outward normal from the massive body toward the dynamic one
    pub normal: DVec3,
    /// Overlap depth (<= 0 when separated)
    pub penetration: f64,
    /// Gap between the two surfaces (negative while overlapping)
    pub gap: f64,
}

/// Geometry of a dynamic/massive pair.
///
/// Returns `None` when no normal can be derived (coincident centers or a
/// radius that was forced to a non-positive value).
pub fn check_sphere_contact(
    position: DVec3,
    radius: f64,
    other_position: DVec3,
    other_radius: f64,
) -> Option<ContactResult> {
    if !radius.is_finite() || !other_radius.is_finite() || radius <= 0.0 || other_radius <= 0.0 {
        return None;
    }
    let offset = position - other_position;
    let distance = offset.length();
    if !distance.is_finite() || distance < MIN_CONTACT_DISTANCE {
        return None;
    }

    let combined = radius + other_radius;
    Some(ContactResult {
        normal: offset / distance,
        penetration: combined - distance,
        gap: distance - combined,
    })
}

/// Reflect the inward normal part of `relative_velocity` with restitution and
/// damp the tangential part. Leaves separating velocities untouched.
pub fn respond_to_impact(
    relative_velocity: DVec3,
    normal: DVec3,
    restitution: f64,
    friction: f64,
) -> DVec3 {
    let vn = relative_velocity.dot(normal);
    if vn >= 0.0 {
        return relative_velocity;
    }
    let tangential = relative_velocity - normal * vn;
    tangential * (1.0 - friction) - normal * (restitution * vn)
}

/// An overlap that was resolved this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The body that was moved
    pub body: BodyId,
    /// The body it was pushed away from
    pub other: BodyId,
    pub normal: DVec3,
    pub penetration: f64,
}

/// A dynamic body resting on a massive one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grounding {
    pub body: BodyId,
    pub surface: BodyId,
    pub gap: f64,
}

/// Everything the resolver did during one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveReport {
    pub contacts: Vec<Contact>,
    pub grounded: Vec<Grounding>,
    /// Pairs skipped because no contact normal could be derived
    pub skipped_pairs: usize,
}

impl ResolveReport {
    pub fn is_grounded(&self, id: BodyId) -> bool {
        self.grounded.iter().any(|g| g.body == id)
    }

    pub fn ground_of(&self, id: BodyId) -> Option<&Grounding> {
        self.grounded
            .iter()
            .filter(|g| g.body == id)
            .min_by(|a, b| a.gap.total_cmp(&b.gap))
    }
}

#[derive(Clone, Copy)]
struct Anchor {
    id: BodyId,
    position: DVec3,
    velocity: DVec3,
    radius: f64,
    mass: f64,
    fixed: bool,
}

impl From<&Body> for Anchor {
    fn from(b: &Body) -> Self {
        Self {
            id: b.id,
            position: b.position,
            velocity: b.velocity,
            radius: b.radius,
            mass: b.mass,
            fixed: b.fixed,
        }
    }
}

/// Resolve every dynamic-vs-massive overlap and report grounding.
///
/// Bodies listed in `excluded` (a flying player, a grabbed prop) are skipped
/// entirely.
pub fn resolve_contacts(
    bodies: &mut [Body],
    config: &ContactConfig,
    excluded: &[BodyId],
) -> ResolveReport {
    let mut report = ResolveReport::default();

    let massive: Vec<usize> = (0..bodies.len()).filter(|&i| bodies[i].is_massive()).collect();
    let dynamic: Vec<usize> = (0..bodies.len())
        .filter(|&i| bodies[i].is_dynamic() && !excluded.contains(&bodies[i].id))
        .collect();

    for &d in &dynamic {
        for &m in &massive {
            let other = Anchor::from(&bodies[m]);
            let me = Anchor::from(&bodies[d]);
            let Some(contact) =
                check_sphere_contact(me.position, me.radius, other.position, other.radius)
            else {
                report.skipped_pairs += 1;
                tracing::warn!(body = %me.id, other = %other.id, "contact pair has no normal, skipped");
                continue;
            };

            if contact.penetration > 0.0 {
                let friction = if bodies[d].kind == BodyKind::Player { 0.0 } else { config.friction };
                let push_dynamic = other.fixed || me.mass <= other.mass;
                let (mover, anchor, normal) = if push_dynamic {
                    (d, other, contact.normal)
                } else {
                    (m, me, -contact.normal)
                };

                let body = &mut bodies[mover];
                body.position += normal * contact.penetration;
                let relative = body.velocity - anchor.velocity;
                body.velocity =
                    anchor.velocity + respond_to_impact(relative, normal, config.restitution, friction);

                report.contacts.push(Contact {
                    body: body.id,
                    other: anchor.id,
                    normal,
                    penetration: contact.penetration,
                });
            }

            // Grounding is judged on the post-resolution state.
            let me = &bodies[d];
            let other = &bodies[m];
            let offset = me.position - other.position;
            let distance = offset.length();
            if distance < MIN_CONTACT_DISTANCE {
                continue;
            }
            let gap = distance - me.radius - other.radius;
            let normal_speed = (me.velocity - other.velocity).dot(offset / distance);
            if gap < config.ground_epsilon && normal_speed.abs() <= config.grounded_speed {
                report.grounded.push(Grounding {
                    body: me.id,
                    surface: other.id,
                    gap,
                });
            }
        }
    }

    report
}
