//! Body records
//!
//! A [`Body`] carries only physics-relevant state. Rendering attributes
//! (color, emissive intensity, meshes) belong to the renderer and are keyed
//! by [`BodyId`] on its side.

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::vector::is_finite;
use crate::error::SimError;

/// Stable, unique body identifier. Never reused by a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What role a body plays in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Planet, moon or star: a surface others collide with and stand on
    Massive,
    /// Small grabbable object
    #[default]
    Prop,
    /// The player's own body
    Player,
}

/// A simulated entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub name: String,
    pub kind: BodyKind,
    /// Mass (>= 0). Zero-mass bodies feel gravity but exert none.
    pub mass: f64,
    /// Collision radius (> 0)
    pub radius: f64,
    pub position: DVec3,
    pub velocity: DVec3,
    /// Resultant acceleration from the last force evaluation
    pub acceleration: DVec3,
    /// Fixed bodies exert gravity but are never moved by the integrator
    pub fixed: bool,
    /// When false the body still exerts gravity but receives none
    /// (the player while flying).
    pub gravity_coupled: bool,
}

impl Body {
    /// True for planets, moons and stars.
    #[inline]
    pub fn is_massive(&self) -> bool {
        self.kind == BodyKind::Massive
    }

    /// True for bodies the contact resolver may move (non-fixed props and players).
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        !self.fixed && self.kind != BodyKind::Massive
    }

    /// Linear momentum `m * v`.
    #[inline]
    pub fn momentum(&self) -> DVec3 {
        self.velocity * self.mass
    }

    /// Distance from `point` to this body's surface (negative inside).
    #[inline]
    pub fn surface_distance(&self, point: DVec3) -> f64 {
        self.position.distance(point) - self.radius
    }
}

/// Description of a body to register.
///
/// `mass` is optional so that descriptions coming from config files can omit
/// it; a missing mass is rejected at registration just like a negative one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    pub name: String,
    #[serde(default)]
    pub kind: BodyKind,
    pub mass: Option<f64>,
    pub radius: f64,
    #[serde(default)]
    pub position: DVec3,
    #[serde(default)]
    pub velocity: DVec3,
    #[serde(default)]
    pub fixed: bool,
}

impl BodySpec {
    /// A planet, moon or star.
    pub fn massive(name: impl Into<String>, mass: f64, radius: f64) -> Self {
        Self {
            name: name.into(),
            kind: BodyKind::Massive,
            mass: Some(mass),
            radius,
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            fixed: false,
        }
    }

    /// A small grabbable object.
    pub fn prop(name: impl Into<String>, mass: f64, radius: f64) -> Self {
        Self {
            kind: BodyKind::Prop,
            ..Self::massive(name, mass, radius)
        }
    }

    /// The player's body.
    pub fn player(mass: f64, radius: f64) -> Self {
        Self {
            kind: BodyKind::Player,
            ..Self::massive("Player", mass, radius)
        }
    }

    pub fn at(mut self, position: DVec3) -> Self {
        self.position = position;
        self
    }

    pub fn moving(mut self, velocity: DVec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Check the registration invariants and return the validated mass.
    pub fn validate(&self) -> Result<f64, SimError> {
        let mass = self
            .mass
            .ok_or_else(|| SimError::InvalidSpec(format!("'{}': mass is missing", self.name)))?;
        validate_mass(&self.name, mass)?;
        validate_radius(&self.name, self.radius)?;
        if !is_finite(self.position) || !is_finite(self.velocity) {
            return Err(SimError::InvalidSpec(format!(
                "'{}': position and velocity must be finite",
                self.name
            )));
        }
        Ok(mass)
    }

    /// Build the body record for an already-validated spec.
    pub(crate) fn into_body(self, id: BodyId, mass: f64) -> Body {
        Body {
            id,
            name: self.name,
            kind: self.kind,
            mass,
            radius: self.radius,
            position: self.position,
            velocity: self.velocity,
            acceleration: DVec3::ZERO,
            fixed: self.fixed,
            gravity_coupled: true,
        }
    }
}

pub(crate) fn validate_mass(name: &str, mass: f64) -> Result<(), SimError> {
    if !mass.is_finite() || mass < 0.0 {
        return Err(SimError::InvalidSpec(format!(
            "'{name}': mass must be finite and >= 0, got {mass}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_radius(name: &str, radius: f64) -> Result<(), SimError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(SimError::InvalidSpec(format!(
            "'{name}': radius must be finite and > 0, got {radius}"
        )));
    }
    Ok(())
}
