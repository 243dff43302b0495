//! Simulation configuration
//!
//! [`SimConfig`] gathers every live-tunable value. It is owned by a
//! [`ConfigStore`], which validates edits as a whole before accepting them
//! and notifies registered listeners afterwards. The world reads the current
//! values at the start of every fixed step, so an accepted edit takes effect
//! on the next step.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::physics::{ContactConfig, GravityConfig};
use crate::player::{GrabConfig, MovementConfig};

/// Physics step length in seconds.
pub const DEFAULT_FIXED_DT: f64 = 1.0 / 120.0;

/// Most fixed steps run for a single rendered frame.
pub const DEFAULT_MAX_SUBSTEPS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub gravity: GravityConfig,
    /// Simulated seconds per real second (0 freezes time without pausing)
    pub time_scale: f64,
    pub fixed_dt: f64,
    pub max_substeps: u32,
    pub contact: ContactConfig,
    pub movement: MovementConfig,
    pub grab: GrabConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: GravityConfig::default(),
            time_scale: 1.0,
            fixed_dt: DEFAULT_FIXED_DT,
            max_substeps: DEFAULT_MAX_SUBSTEPS,
            contact: ContactConfig::default(),
            movement: MovementConfig::default(),
            grab: GrabConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        self.gravity.validate()?;
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "time scale must be finite and >= 0, got {}",
                self.time_scale
            )));
        }
        if !self.fixed_dt.is_finite() || self.fixed_dt <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "fixed dt must be finite and > 0, got {}",
                self.fixed_dt
            )));
        }
        if self.max_substeps == 0 {
            return Err(SimError::InvalidConfig(
                "max substeps must be at least 1".to_string(),
            ));
        }
        self.contact.validate()?;
        self.movement.validate()?;
        self.grab.validate()
    }

    /// Largest backlog the accumulator may hold.
    pub fn max_backlog(&self) -> f64 {
        self.fixed_dt * self.max_substeps as f64
    }
}

/// A partial edit. Unset fields keep their current value.
///
/// `max_accel: Some(None)` removes the acceleration cap; in JSON, leaving the
/// field out (or `null`) keeps the current cap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub g: Option<f64>,
    pub softening_length: Option<f64>,
    pub max_accel: Option<Option<f64>>,
    pub time_scale: Option<f64>,
    pub fixed_dt: Option<f64>,
    pub max_substeps: Option<u32>,
    pub contact: Option<ContactConfig>,
    pub movement: Option<MovementConfig>,
    pub grab: Option<GrabConfig>,
}

impl ConfigPatch {
    /// The config that results from applying this patch to `base`.
    pub fn merged(&self, base: &SimConfig) -> SimConfig {
        let mut next = *base;
        if let Some(g) = self.g {
            next.gravity.g = g;
        }
        if let Some(softening) = self.softening_length {
            next.gravity.softening_length = softening;
        }
        if let Some(max_accel) = self.max_accel {
            next.gravity.max_accel = max_accel;
        }
        if let Some(scale) = self.time_scale {
            next.time_scale = scale;
        }
        if let Some(dt) = self.fixed_dt {
            next.fixed_dt = dt;
        }
        if let Some(substeps) = self.max_substeps {
            next.max_substeps = substeps;
        }
        if let Some(contact) = self.contact {
            next.contact = contact;
        }
        if let Some(movement) = self.movement {
            next.movement = movement;
        }
        if let Some(grab) = self.grab {
            next.grab = grab;
        }
        next
    }
}

type Listener = Box<dyn FnMut(&SimConfig)>;

/// Owner of the live config.
pub struct ConfigStore {
    current: SimConfig,
    revision: u64,
    listeners: Vec<Listener>,
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("current", &self.current)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ConfigStore {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            current: config,
            revision: 0,
            listeners: Vec::new(),
        })
    }

    pub fn get(&self) -> &SimConfig {
        &self.current
    }

    /// Number of accepted edits so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply a partial edit. On rejection the previous config stays in effect.
    pub fn apply(&mut self, patch: &ConfigPatch) -> Result<&SimConfig, SimError> {
        self.replace(patch.merged(&self.current))
    }

    /// Replace the whole config after validating it.
    pub fn replace(&mut self, config: SimConfig) -> Result<&SimConfig, SimError> {
        if let Err(err) = config.validate() {
            tracing::warn!(%err, "config edit rejected");
            return Err(err);
        }
        self.current = config;
        self.revision += 1;
        for listener in &mut self.listeners {
            listener(&self.current);
        }
        Ok(&self.current)
    }

    /// Register a callback invoked with the new config after every accepted edit.
    pub fn subscribe(&mut self, listener: impl FnMut(&SimConfig) + 'static) {
        self.listeners.push(Box::new(listener));
    }
}
