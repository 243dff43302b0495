//! Player Movement Controller
//!
//! Surface-relative locomotion for a player who walks on (and flies between)
//! gravitating bodies. "Up" is not a world axis: it is derived every tick from
//! the nearest massive surface and smoothed, so stepping from one planet's
//! pull into another's never snaps the view.
//!
//! # Modes
//!
//! - **Walking**: camera forward/right are projected onto the tangent plane of
//!   `up_vector`; the horizontal velocity (relative to the nearest body) is
//!   blended toward the input while the component along `up_vector` is kept,
//!   since it carries gravity and jumps. N-body gravity acts on the player.
//! - **Flying**: free 6-DOF movement in camera space with acceleration, a max
//!   speed, and exponential damping when idle. Gravity is decoupled and the
//!   player is excluded from grounding.
//!
//! Velocities in both modes are expressed relative to the nearest massive
//! body, so a player standing on an orbiting planet moves with it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gravwalk_engine::player::{MovementConfig, PlayerMovementController};
//!
//! let mut controller = PlayerMovementController::new(player_id, DVec3::Y);
//!
//! // Each fixed step, before the integrator:
//! controller.update(dt, &input, &camera, &mut registry, &config)?;
//! // After the contact resolver:
//! controller.set_grounded(report.is_grounded(player_id), &config);
//! ```

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::camera::CameraFrame;
use crate::error::SimError;
use crate::input::MovementInput;
use crate::physics::vector::{normalize_or, project_on_plane};
use crate::physics::{Body, BodyId, BodyRegistry};

/// Dot product under which the desired up is treated as the exact opposite
/// of the current one.
const ANTIPODAL_DOT: f64 = -0.9999;

/// Locomotion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    #[default]
    Walking,
    Flying,
}

/// Tuning for both locomotion modes. Rates are per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub walk_speed: f64,
    pub sprint_speed: f64,
    /// How quickly horizontal velocity approaches the input target
    pub responsiveness: f64,
    /// How quickly `up_vector` turns toward the nearest surface normal
    pub align_rate: f64,
    pub jump_speed: f64,
    /// Grace period after leaving the ground during which a jump still works
    pub coyote_time: f64,
    pub fly_speed: f64,
    pub fly_boost_speed: f64,
    pub fly_acceleration: f64,
    /// Exponential decay rate of idle flight velocity
    pub fly_damping: f64,
    /// Camera offset along `up_vector` from the body center
    pub eye_height: f64,
    /// Minimum pull toward the surface while walking (0 = pure N-body)
    pub min_walking_gravity: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            sprint_speed: 10.0,
            responsiveness: 12.0,
            align_rate: 8.0,
            jump_speed: 8.0,
            coyote_time: 0.1,
            fly_speed: 20.0,
            fly_boost_speed: 50.0,
            fly_acceleration: 30.0,
            fly_damping: 3.0,
            eye_height: 1.6,
            min_walking_gravity: 0.0,
        }
    }
}

impl MovementConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        let fields = [
            ("walk_speed", self.walk_speed),
            ("sprint_speed", self.sprint_speed),
            ("responsiveness", self.responsiveness),
            ("align_rate", self.align_rate),
            ("jump_speed", self.jump_speed),
            ("coyote_time", self.coyote_time),
            ("fly_speed", self.fly_speed),
            ("fly_boost_speed", self.fly_boost_speed),
            ("fly_acceleration", self.fly_acceleration),
            ("fly_damping", self.fly_damping),
            ("eye_height", self.eye_height),
            ("min_walking_gravity", self.min_walking_gravity),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "movement.{name} must be finite and >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// The massive body whose surface is closest to `point`.
pub fn nearest_surface<'a>(bodies: &'a [Body], point: DVec3) -> Option<&'a Body> {
    bodies
        .iter()
        .filter(|b| b.is_massive())
        .min_by(|a, b| a.surface_distance(point).total_cmp(&b.surface_distance(point)))
}

/// Surface-relative Walking/Flying state machine for the player body.
///
/// Holds only ids; the body itself lives in the registry.
#[derive(Debug, Clone)]
pub struct PlayerMovementController {
    body: BodyId,
    /// Unit up direction, smoothed toward the nearest surface normal
    up_vector: DVec3,
    mode: MovementMode,
    is_grounded: bool,
    nearest_body: Option<BodyId>,
    coyote_time_remaining: f64,
}

impl PlayerMovementController {
    pub fn new(body: BodyId, up: DVec3) -> Self {
        Self {
            body,
            up_vector: normalize_or(up, DVec3::Y).dir,
            mode: MovementMode::Walking,
            is_grounded: false,
            nearest_body: None,
            coyote_time_remaining: 0.0,
        }
    }

    pub fn body_id(&self) -> BodyId {
        self.body
    }

    pub fn up_vector(&self) -> DVec3 {
        self.up_vector
    }

    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    pub fn is_flying(&self) -> bool {
        self.mode == MovementMode::Flying
    }

    pub fn is_grounded(&self) -> bool {
        self.is_grounded
    }

    pub fn nearest_body(&self) -> Option<BodyId> {
        self.nearest_body
    }

    pub fn coyote_time_remaining(&self) -> f64 {
        self.coyote_time_remaining
    }

    /// Jump is allowed when grounded or within coyote time.
    pub fn can_jump(&self) -> bool {
        self.mode == MovementMode::Walking
            && (self.is_grounded || self.coyote_time_remaining > 0.0)
    }

    /// Record the grounding result of the latest contact pass.
    ///
    /// Landing refills coyote time; leaving the ground lets it run down.
    pub fn set_grounded(&mut self, grounded: bool, config: &MovementConfig) {
        let grounded = grounded && self.mode == MovementMode::Walking;
        if grounded {
            self.coyote_time_remaining = config.coyote_time;
        }
        self.is_grounded = grounded;
    }

    /// Rotation taking +Y to the current up vector.
    pub fn orientation(&self) -> DQuat {
        DQuat::from_rotation_arc(DVec3::Y, self.up_vector)
    }

    /// Camera anchor for a body centered at `body_position`.
    pub fn eye_position(&self, body_position: DVec3, config: &MovementConfig) -> DVec3 {
        body_position + self.up_vector * config.eye_height
    }

    /// Forget transient state after the world is rebuilt.
    pub fn reset(&mut self, up: DVec3) {
        self.up_vector = normalize_or(up, DVec3::Y).dir;
        self.mode = MovementMode::Walking;
        self.is_grounded = false;
        self.nearest_body = None;
        self.coyote_time_remaining = 0.0;
    }

    /// Switch between Walking and Flying.
    ///
    /// The player's velocity is reset to that of the nearest body so momentum
    /// from one mode's reference frame cannot launch the player in the other.
    pub fn toggle_flight(&mut self, registry: &mut BodyRegistry) -> Result<MovementMode, SimError> {
        let position = registry.body(self.body)?.position;
        let frame_velocity = nearest_surface(registry.bodies(), position)
            .map(|b| b.velocity)
            .unwrap_or(DVec3::ZERO);

        self.mode = match self.mode {
            MovementMode::Walking => MovementMode::Flying,
            MovementMode::Flying => MovementMode::Walking,
        };
        self.is_grounded = false;
        self.coyote_time_remaining = 0.0;

        let body = registry.body_mut(self.body)?;
        body.velocity = frame_velocity;
        body.gravity_coupled = self.mode == MovementMode::Walking;

        tracing::info!(mode = ?self.mode, "flight mode toggled");
        Ok(self.mode)
    }

    /// Advance the controller by one fixed step, writing the player's new
    /// velocity into the registry.
    pub fn update(
        &mut self,
        dt: f64,
        input: &MovementInput,
        camera: &CameraFrame,
        registry: &mut BodyRegistry,
        config: &MovementConfig,
    ) -> Result<(), SimError> {
        let position = registry.body(self.body)?.position;
        let nearest = nearest_surface(registry.bodies(), position)
            .map(|b| (b.id, b.position, b.velocity));
        self.nearest_body = nearest.map(|(id, _, _)| id);
        let frame_velocity = nearest.map(|(_, _, v)| v).unwrap_or(DVec3::ZERO);

        match self.mode {
            MovementMode::Walking => {
                if let Some((_, center, _)) = nearest {
                    self.align_up(position - center, dt, config);
                }
                self.update_walking(dt, input, camera, frame_velocity, registry, config)
            }
            MovementMode::Flying => {
                self.update_flying(dt, input, camera, frame_velocity, registry, config)
            }
        }
    }

    /// Turn `up_vector` toward `surface_offset` by at most `align_rate * dt`
    /// of the way.
    fn align_up(&mut self, surface_offset: DVec3, dt: f64, config: &MovementConfig) {
        let desired = normalize_or(surface_offset, self.up_vector).dir;
        // Lerping toward the exact opposite never leaves the current axis;
        // start the turn through a perpendicular instead.
        let target = if self.up_vector.dot(desired) < ANTIPODAL_DOT {
            self.up_vector.any_orthonormal_vector()
        } else {
            desired
        };
        let t = (config.align_rate * dt).clamp(0.0, 1.0);
        self.up_vector = normalize_or(self.up_vector.lerp(target, t), desired).dir;
    }

    /// Tangent-plane forward and right for the current up vector.
    ///
    /// Looking straight down (or up) leaves nothing of `forward` in the
    /// plane, so the camera's own up takes over as the forward reference.
    fn tangent_basis(&self, camera: &CameraFrame) -> (DVec3, DVec3) {
        let up = self.up_vector;
        let fallback = normalize_or(project_on_plane(camera.up, up), up.any_orthonormal_vector()).dir;
        let forward = normalize_or(project_on_plane(camera.forward, up), fallback).dir;
        let right = forward.cross(up);
        (forward, right)
    }

    fn update_walking(
        &mut self,
        dt: f64,
        input: &MovementInput,
        camera: &CameraFrame,
        frame_velocity: DVec3,
        registry: &mut BodyRegistry,
        config: &MovementConfig,
    ) -> Result<(), SimError> {
        let up = self.up_vector;
        let (forward, right) = self.tangent_basis(camera);

        let axes = input.axes();
        let speed = if input.boost {
            config.sprint_speed
        } else {
            config.walk_speed
        };
        let desired = (forward * axes.z + right * axes.x) * speed;

        let body = registry.body_mut(self.body)?;
        let relative = body.velocity - frame_velocity;
        let mut vertical = up * relative.dot(up);
        let horizontal = relative - vertical;
        let blend = (config.responsiveness * dt).clamp(0.0, 1.0);
        let horizontal = horizontal.lerp(desired, blend);

        if input.jump && self.can_jump() {
            vertical += up * config.jump_speed;
            // No second jump until the resolver reports ground again
            self.is_grounded = false;
            self.coyote_time_remaining = 0.0;
        }

        if config.min_walking_gravity > 0.0 {
            let pull = -body.acceleration.dot(up);
            let deficit = config.min_walking_gravity - pull;
            if deficit > 0.0 {
                vertical -= up * (deficit * dt);
            }
        }

        body.velocity = frame_velocity + horizontal + vertical;
        body.gravity_coupled = true;

        if !self.is_grounded {
            self.coyote_time_remaining = (self.coyote_time_remaining - dt).max(0.0);
        }
        Ok(())
    }

    fn update_flying(
        &mut self,
        dt: f64,
        input: &MovementInput,
        camera: &CameraFrame,
        frame_velocity: DVec3,
        registry: &mut BodyRegistry,
        config: &MovementConfig,
    ) -> Result<(), SimError> {
        let axes = input.axes();
        let direction = camera.right() * axes.x + camera.up * axes.y + camera.forward * axes.z;
        let max_speed = if input.boost {
            config.fly_boost_speed
        } else {
            config.fly_speed
        };

        let body = registry.body_mut(self.body)?;
        let mut relative = body.velocity - frame_velocity;
        if input.has_direction() {
            relative += direction * (config.fly_acceleration * dt);
            relative = relative.clamp_length_max(max_speed);
        } else {
            relative *= (-config.fly_damping * dt).exp();
        }

        body.velocity = frame_velocity + relative;
        body.gravity_coupled = false;
        self.is_grounded = false;
        Ok(())
    }
}
