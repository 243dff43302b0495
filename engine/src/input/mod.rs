//! Input Module
//!
//! Platform-agnostic movement input. Raw event wiring (key listeners, pointer
//! lock) stays with the host, which maps its own key state onto a
//! [`MovementInput`] each frame.
//!
//! # Example
//!
//! ```rust,ignore
//! use gravwalk_engine::input::MovementInput;
//!
//! let forward = if w_down { 1.0 } else { 0.0 };
//! world.movement_input(MovementInput::new(0.0, 0.0, forward).with_boost());
//! ```

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::physics::vector::clamp_length;

/// Desired movement for the next physics step, in camera space.
///
/// `right`/`up`/`forward` are axis values in `[-1, 1]`. Walking ignores
/// `up` and uses `jump` instead; flying uses all three axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementInput {
    pub right: f64,
    pub up: f64,
    pub forward: f64,
    pub jump: bool,
    /// Sprint while walking, boost while flying
    pub boost: bool,
}

impl MovementInput {
    pub fn new(right: f64, up: f64, forward: f64) -> Self {
        Self {
            right,
            up,
            forward,
            ..Default::default()
        }
    }

    pub fn with_jump(mut self) -> Self {
        self.jump = true;
        self
    }

    pub fn with_boost(mut self) -> Self {
        self.boost = true;
        self
    }

    /// Sanitized axes as `(right, up, forward)`, at most unit length.
    ///
    /// Non-finite components read as zero so a bad host value cannot poison
    /// the player's velocity.
    pub fn axes(&self) -> DVec3 {
        let clean = |v: f64| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        clamp_length(
            DVec3::new(clean(self.right), clean(self.up), clean(self.forward)),
            1.0,
        )
    }

    /// True when any movement axis is non-zero.
    pub fn has_direction(&self) -> bool {
        self.axes().length_squared() > 1e-6
    }
}
