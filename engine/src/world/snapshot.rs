//! Snapshots
//!
//! Read-only views of the world handed to collaborators once per frame:
//! per-body records for the renderer, a flat position array for transports,
//! GPU-ready instance records, and a versioned save file.

use bytemuck::{Pod, Zeroable};
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::physics::gravity::{
    angular_momentum, center_of_mass, kinetic_energy, potential_energy, total_momentum,
};
use crate::physics::{Body, BodyId, GravityConfig};
use crate::world::config::SimConfig;

/// Save file format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// What the renderer needs to place one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub position: DVec3,
    pub velocity: DVec3,
}

impl From<&Body> for BodySnapshot {
    fn from(body: &Body) -> Self {
        Self {
            id: body.id,
            position: body.position,
            velocity: body.velocity,
        }
    }
}

/// Per-instance data for a sphere draw call (16 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BodyInstance {
    /// World position, narrowed to f32 for upload
    pub position: [f32; 3],
    pub radius: f32,
}

static_assertions::assert_eq_size!(BodyInstance, [u8; 16]);

impl From<&Body> for BodyInstance {
    fn from(body: &Body) -> Self {
        Self {
            position: body.position.as_vec3().to_array(),
            radius: body.radius as f32,
        }
    }
}

/// `[x0, y0, z0, x1, y1, z1, ...]` in registry order.
pub fn positions_flat(bodies: &[Body]) -> Vec<f64> {
    bodies.iter().flat_map(|b| b.position.to_array()).collect()
}

/// Full world state for save/restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub version: u32,
    /// Simulated seconds since the world was built
    pub time: f64,
    pub tick: u64,
    pub config: SimConfig,
    pub bodies: Vec<Body>,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SimError::InvalidSpec(format!(
                "snapshot version {} is not supported (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

/// Conserved quantities of the whole system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Diagnostics {
    pub total_momentum: DVec3,
    pub center_of_mass: Option<DVec3>,
    pub kinetic_energy: f64,
    pub potential_energy: f64,
    pub total_energy: f64,
    /// About the center of mass (origin when the system is massless)
    pub angular_momentum: DVec3,
}

impl Diagnostics {
    pub fn measure(bodies: &[Body], gravity: &GravityConfig) -> Self {
        let com = center_of_mass(bodies);
        let kinetic = kinetic_energy(bodies);
        let potential = potential_energy(bodies, gravity);
        Self {
            total_momentum: total_momentum(bodies),
            center_of_mass: com,
            kinetic_energy: kinetic,
            potential_energy: potential,
            total_energy: kinetic + potential,
            angular_momentum: angular_momentum(bodies, com.unwrap_or(DVec3::ZERO)),
        }
    }
}
