//! World presets
//!
//! A JSON description of a planetary system: massive bodies (optionally on
//! circular orbits around a named parent), the player's spawn point and a few
//! props resting on surfaces. Orbit chains are resolved by an explicit
//! topological sort so parents are always placed before their children.

use std::collections::HashMap;
use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::physics::OrbitParams;
use crate::world::config::SimConfig;

const DEFAULT_SYSTEM_JSON: &str = include_str!("../../presets/default_system.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldPreset {
    pub name: String,
    #[serde(default)]
    pub config: SimConfig,
    pub bodies: Vec<PresetBody>,
    pub player: PlayerSpawn,
    #[serde(default)]
    pub props: Vec<PresetProp>,
}

/// A planet, moon or star.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetBody {
    pub name: String,
    pub mass: Option<f64>,
    pub radius: f64,
    #[serde(default)]
    pub fixed: bool,
    /// Used when the body has no orbit
    #[serde(default)]
    pub position: DVec3,
    #[serde(default)]
    pub velocity: DVec3,
    #[serde(default)]
    pub orbit: Option<PresetOrbit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetOrbit {
    pub parent: String,
    pub radius: f64,
    #[serde(default)]
    pub phase_deg: f64,
    #[serde(default)]
    pub inclination_deg: f64,
}

impl PresetOrbit {
    pub fn params(&self) -> OrbitParams {
        OrbitParams::new(
            self.radius,
            self.phase_deg.to_radians(),
            self.inclination_deg.to_radians(),
        )
    }
}

/// A point on (or above) a body's surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    /// Name of the body to stand on
    pub on: String,
    #[serde(default)]
    pub latitude_deg: f64,
    #[serde(default)]
    pub longitude_deg: f64,
    /// Gap between the two surfaces
    #[serde(default)]
    pub altitude: f64,
}

impl SurfacePoint {
    /// Unit direction from the body center (latitude toward +Y).
    pub fn direction(&self) -> DVec3 {
        let (sin_lat, cos_lat) = self.latitude_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.longitude_deg.to_radians().sin_cos();
        DVec3::new(cos_lat * cos_lon, sin_lat, cos_lat * sin_lon)
    }
}

fn default_player_mass() -> f64 {
    1.0
}

fn default_player_radius() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSpawn {
    #[serde(default = "default_player_mass")]
    pub mass: f64,
    #[serde(default = "default_player_radius")]
    pub radius: f64,
    #[serde(flatten)]
    pub at: SurfacePoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetProp {
    pub name: String,
    pub mass: f64,
    pub radius: f64,
    #[serde(flatten)]
    pub at: SurfacePoint,
}

impl WorldPreset {
    /// The built-in system: a star, two planets and a moon.
    pub fn default_system() -> Result<Self, SimError> {
        Self::from_json(DEFAULT_SYSTEM_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let preset: Self = serde_json::from_str(json)?;
        preset.validate()?;
        Ok(preset)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Index of the massive body called `name`.
    pub fn body_index(&self, name: &str) -> Option<usize> {
        self.bodies.iter().position(|b| b.name == name)
    }

    /// Structural checks: unique names, known references, acyclic orbits.
    pub fn validate(&self) -> Result<(), SimError> {
        self.config
            .validate()
            .map_err(|e| SimError::InvalidSpec(format!("preset '{}': {e}", self.name)))?;

        let mut seen = HashMap::new();
        for (i, body) in self.bodies.iter().enumerate() {
            if seen.insert(body.name.as_str(), i).is_some() {
                return Err(SimError::InvalidSpec(format!(
                    "duplicate body name '{}'",
                    body.name
                )));
            }
        }

        let surfaces = std::iter::once(&self.player.at).chain(self.props.iter().map(|p| &p.at));
        for point in surfaces {
            if self.body_index(&point.on).is_none() {
                return Err(SimError::InvalidSpec(format!(
                    "surface point refers to unknown body '{}'",
                    point.on
                )));
            }
        }

        self.orbit_order().map(|_| ())
    }

    /// Body indices ordered so every orbit parent precedes its children.
    ///
    /// Bodies without an orbit come first, in file order. Missing parents and
    /// cycles are rejected.
    pub fn orbit_order(&self) -> Result<Vec<usize>, SimError> {
        let n = self.bodies.len();
        let mut parent_of = vec![None; n];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, body) in self.bodies.iter().enumerate() {
            if let Some(orbit) = &body.orbit {
                let parent = self.body_index(&orbit.parent).ok_or_else(|| {
                    SimError::InvalidSpec(format!(
                        "'{}' orbits unknown body '{}'",
                        body.name, orbit.parent
                    ))
                })?;
                parent_of[i] = Some(parent);
                children[parent].push(i);
            }
        }

        // Kahn's algorithm; each node has at most one parent.
        let mut order: Vec<usize> = (0..n).filter(|&i| parent_of[i].is_none()).collect();
        let mut next = 0;
        while next < order.len() {
            let node = order[next];
            order.extend(children[node].iter().copied());
            next += 1;
        }

        if order.len() != n {
            let stuck: Vec<&str> = (0..n)
                .filter(|i| !order.contains(i))
                .map(|i| self.bodies[i].name.as_str())
                .collect();
            return Err(SimError::InvalidSpec(format!(
                "orbit cycle between {}",
                stuck.join(", ")
            )));
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(name: &str, parent: Option<&str>) -> PresetBody {
        PresetBody {
            name: name.to_string(),
            mass: Some(10.0),
            radius: 1.0,
            fixed: false,
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            orbit: parent.map(|p| PresetOrbit {
                parent: p.to_string(),
                radius: 50.0,
                phase_deg: 0.0,
                inclination_deg: 0.0,
            }),
        }
    }

    fn preset(bodies: Vec<PresetBody>) -> WorldPreset {
        WorldPreset {
            name: "test".to_string(),
            config: SimConfig::default(),
            player: PlayerSpawn {
                mass: 1.0,
                radius: 0.5,
                at: SurfacePoint {
                    on: bodies[0].name.clone(),
                    latitude_deg: 0.0,
                    longitude_deg: 0.0,
                    altitude: 0.0,
                },
            },
            bodies,
            props: Vec::new(),
        }
    }

    #[test]
    fn test_default_system_loads() {
        let preset = WorldPreset::default_system().unwrap();
        assert!(preset.bodies.len() >= 3);
        assert!(preset.body_index(&preset.player.at.on).is_some());
        assert!(!preset.props.is_empty());
    }

    #[test]
    fn test_orbit_order_places_parents_first() {
        // Declared child-first on purpose
        let p = preset(vec![
            body("Luna", Some("Terra")),
            body("Terra", Some("Sun")),
            body("Sun", None),
        ]);
        let order = p.orbit_order().unwrap();
        let pos = |name: &str| order.iter().position(|&i| p.bodies[i].name == name).unwrap();
        assert!(pos("Sun") < pos("Terra"));
        assert!(pos("Terra") < pos("Luna"));
    }

    #[test]
    fn test_missing_parent_rejected() {
        let p = preset(vec![body("Terra", Some("Nowhere"))]);
        assert!(matches!(p.orbit_order(), Err(SimError::InvalidSpec(_))));
    }

    #[test]
    fn test_cycle_rejected() {
        let p = preset(vec![body("A", Some("B")), body("B", Some("A")), body("C", None)]);
        let err = p.orbit_order().unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let p = preset(vec![body("A", None), body("A", None)]);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_unknown_surface_body_rejected() {
        let mut p = preset(vec![body("A", None)]);
        p.player.at.on = "B".to_string();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_surface_direction() {
        let mut point = SurfacePoint {
            on: "A".to_string(),
            latitude_deg: 90.0,
            longitude_deg: 0.0,
            altitude: 1.0,
        };
        assert!((point.direction() - DVec3::Y).length() < 1e-12);

        point.latitude_deg = 0.0;
        point.longitude_deg = 90.0;
        assert!((point.direction() - DVec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_json_round_trip_keeps_orbits() {
        let preset = WorldPreset::default_system().unwrap();
        let again = WorldPreset::from_json(&preset.to_json().unwrap()).unwrap();
        assert_eq!(again, preset);
    }
}
