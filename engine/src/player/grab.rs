//! Grab subsystem
//!
//! Spring-held prop manipulation. While a [`GrabConstraint`] is alive it
//! fully determines the held body's velocity each tick, pulling it toward a
//! hold point in front of the camera; the body is decoupled from gravity and
//! skipped by the contact resolver until released.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::camera::{CameraFrame, Ray, SphereTarget, nearest_sphere_hit};
use crate::error::SimError;
use crate::physics::vector::is_finite;
use crate::physics::{BodyId, BodyKind, BodyRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    /// Farthest prop center that can be picked
    pub grab_distance: f64,
    /// Distance of the hold point in front of the camera
    pub hold_distance: f64,
    /// Spring gain in 1/s; capped at 1/dt so a step never overshoots
    pub stiffness: f64,
    /// Extra slack around a prop's radius when picking
    pub pick_tolerance: f64,
    /// Speed added along the camera forward on a throw
    pub throw_speed: f64,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            grab_distance: 5.0,
            hold_distance: 2.0,
            stiffness: 30.0,
            pick_tolerance: 0.25,
            throw_speed: 15.0,
        }
    }
}

impl GrabConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        let fields = [
            ("grab_distance", self.grab_distance),
            ("hold_distance", self.hold_distance),
            ("stiffness", self.stiffness),
            ("pick_tolerance", self.pick_tolerance),
            ("throw_speed", self.throw_speed),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "grab.{name} must be finite and >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// A live grab. Holds the prop's id only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabConstraint {
    pub grabbed: BodyId,
    pub hold_distance: f64,
    pub stiffness: f64,
}

#[derive(Debug, Clone, Default)]
pub struct GrabSubsystem {
    constraint: Option<GrabConstraint>,
}

impl GrabSubsystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constraint(&self) -> Option<&GrabConstraint> {
        self.constraint.as_ref()
    }

    pub fn grabbed(&self) -> Option<BodyId> {
        self.constraint.map(|c| c.grabbed)
    }

    pub fn is_holding(&self) -> bool {
        self.constraint.is_some()
    }

    /// Pick the nearest non-fixed prop along `ray` within `max_distance`.
    ///
    /// Returns `None` when nothing is hit or a prop is already held.
    pub fn try_grab(
        &mut self,
        ray: &Ray,
        max_distance: f64,
        registry: &mut BodyRegistry,
        config: &GrabConfig,
    ) -> Option<BodyId> {
        if self.constraint.is_some() {
            return None;
        }

        let targets = registry
            .iter()
            .filter(|b| b.kind == BodyKind::Prop && !b.fixed)
            .map(|b| SphereTarget {
                key: b.id,
                center: b.position,
                radius: b.radius,
            });
        let (id, distance) = nearest_sphere_hit(ray, targets, max_distance, config.pick_tolerance)?;

        let body = registry.get_body_mut(id)?;
        body.gravity_coupled = false;
        self.constraint = Some(GrabConstraint {
            grabbed: id,
            hold_distance: config.hold_distance,
            stiffness: config.stiffness,
        });
        tracing::info!(body = %id, distance, "prop grabbed");
        Some(id)
    }

    /// Drive the held body toward the hold point.
    ///
    /// `anchor_velocity` is the velocity of whatever carries the camera (the
    /// player body), so a prop held on an orbiting planet keeps up with it.
    /// A held body that no longer exists silently ends the grab.
    pub fn update(
        &mut self,
        dt: f64,
        camera: &CameraFrame,
        anchor_velocity: DVec3,
        registry: &mut BodyRegistry,
    ) {
        let Some(constraint) = self.constraint else {
            return;
        };
        let Some(body) = registry.get_body_mut(constraint.grabbed) else {
            tracing::warn!(body = %constraint.grabbed, "held body vanished, dropping grab");
            self.constraint = None;
            return;
        };

        let target = camera.point_ahead(constraint.hold_distance);
        let gain = if dt > 0.0 {
            constraint.stiffness.min(1.0 / dt)
        } else {
            constraint.stiffness
        };
        body.velocity = anchor_velocity + (target - body.position) * gain;
    }

    /// End the grab, optionally adding `impulse` (a velocity change) to the
    /// body so it flies off on its own.
    pub fn release(&mut self, impulse: Option<DVec3>, registry: &mut BodyRegistry) -> Option<BodyId> {
        let constraint = self.constraint.take()?;
        if let Some(body) = registry.get_body_mut(constraint.grabbed) {
            body.gravity_coupled = true;
            if let Some(impulse) = impulse.filter(|i| is_finite(*i)) {
                body.velocity += impulse;
            }
        }
        tracing::info!(body = %constraint.grabbed, thrown = impulse.is_some(), "prop released");
        Some(constraint.grabbed)
    }

    /// Release and throw along the camera forward at `throw_speed`.
    pub fn release_with_throw(
        &mut self,
        camera: &CameraFrame,
        config: &GrabConfig,
        registry: &mut BodyRegistry,
    ) -> Option<BodyId> {
        self.release(Some(camera.forward * config.throw_speed), registry)
    }

    /// Drop the constraint if it refers to `id` (the body is being removed).
    pub fn forget(&mut self, id: BodyId) {
        if self.grabbed() == Some(id) {
            self.constraint = None;
        }
    }
}
