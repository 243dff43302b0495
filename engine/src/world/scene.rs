//! Gravity world
//!
//! [`GravityWorld`] composes the registry, integrator, contact resolver,
//! movement controller and grab subsystem behind one fixed-step loop.
//! Collaborators drive it once per rendered frame with [`GravityWorld::step`]
//! and read the result back with [`GravityWorld::get_snapshot`].

use std::collections::HashSet;

use glam::DVec3;

use crate::camera::{CameraFrame, FPSCameraController, Ray};
use crate::error::SimError;
use crate::input::MovementInput;
use crate::physics::body::{validate_mass, validate_radius};
use crate::physics::orbit::place_orbit;
use crate::physics::vector::{FALLBACK_UP, normalize_or};
use crate::physics::{
    Body, BodyId, BodyKind, BodyRegistry, BodySpec, OrbitParams, ResolveReport, StepStats,
    resolve_contacts, step_leapfrog, zero_momentum,
};
use crate::player::{GrabSubsystem, MovementMode, PlayerMovementController, nearest_surface};
use crate::world::config::{ConfigPatch, ConfigStore, SimConfig};
use crate::world::preset::WorldPreset;
use crate::world::snapshot::{
    BodyInstance, BodySnapshot, Diagnostics, SNAPSHOT_VERSION, WorldSnapshot, positions_flat,
};

/// How a body is put back in place by [`GravityWorld::reset_orbits`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Fixed starting state
    Free { position: DVec3, velocity: DVec3 },
    /// Circular orbit around `primary`
    Orbit { primary: BodyId, params: OrbitParams },
    /// Resting on `anchor`'s surface along `direction`
    Surface {
        anchor: BodyId,
        direction: DVec3,
        altitude: f64,
    },
    /// At a fixed offset from `anchor`'s center, moving with it
    Anchored { anchor: BodyId, offset: DVec3 },
}

impl Placement {
    /// Body that must be placed first.
    pub fn depends_on(&self) -> Option<BodyId> {
        match *self {
            Placement::Free { .. } => None,
            Placement::Orbit { primary, .. } => Some(primary),
            Placement::Surface { anchor, .. } | Placement::Anchored { anchor, .. } => Some(anchor),
        }
    }
}

/// Where the camera frame comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    /// Derived from the player body, its up vector and mouse look
    #[default]
    FirstPerson,
    /// Supplied by the host with [`GravityWorld::set_camera`]
    External,
}

/// Simulated time since the world was built.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimClock {
    pub time: f64,
    pub tick: u64,
}

impl SimClock {
    fn advance(&mut self, dt: f64) {
        self.time += dt;
        self.tick += 1;
    }
}

/// The simulation core.
///
/// Built once from a [`WorldPreset`] (or a bare config plus a player body).
/// Call [`step`](GravityWorld::step) each frame with the render delta; every
/// other entry point is safe to call between frames.
pub struct GravityWorld {
    registry: BodyRegistry,
    config: ConfigStore,

    // -- Player --
    player: BodyId,
    controller: PlayerMovementController,
    grab: GrabSubsystem,
    input: MovementInput,

    // -- Camera --
    look: FPSCameraController,
    camera: CameraFrame,
    camera_mode: CameraMode,

    // -- Loop state --
    layout: Vec<(BodyId, Placement)>,
    accumulator: f64,
    paused: bool,
    clock: SimClock,
    last_stats: StepStats,
    last_contacts: ResolveReport,
}

impl GravityWorld {
    /// An empty world holding only the player body.
    pub fn new(config: SimConfig, player: BodySpec) -> Result<Self, SimError> {
        let config = ConfigStore::new(config)?;
        let mut registry = BodyRegistry::new();
        let placement = Placement::Free {
            position: player.position,
            velocity: player.velocity,
        };
        let player = registry.add_body(BodySpec {
            kind: BodyKind::Player,
            ..player
        })?;

        let mut world = Self {
            registry,
            config,
            player,
            controller: PlayerMovementController::new(player, FALLBACK_UP),
            grab: GrabSubsystem::new(),
            input: MovementInput::default(),
            look: FPSCameraController::new(),
            camera: CameraFrame::default(),
            camera_mode: CameraMode::FirstPerson,
            layout: vec![(player, placement)],
            accumulator: 0.0,
            paused: false,
            clock: SimClock::default(),
            last_stats: StepStats::default(),
            last_contacts: ResolveReport::default(),
        };
        world.settle_player();
        world.sync_camera()?;
        Ok(world)
    }

    /// Build a world from a preset: massive bodies, orbits (parents first),
    /// the player, props, then momentum zeroing.
    pub fn from_preset(preset: &WorldPreset) -> Result<Self, SimError> {
        preset.validate()?;
        let order = preset.orbit_order()?;

        let spawn = &preset.player;
        let mut world = Self::new(preset.config, BodySpec::player(spawn.mass, spawn.radius))?;

        let mut ids = vec![BodyId(0); preset.bodies.len()];
        for (slot, body) in preset.bodies.iter().enumerate() {
            let mut spec = BodySpec::massive(body.name.clone(), 0.0, body.radius)
                .at(body.position)
                .moving(body.velocity);
            spec.mass = body.mass;
            if body.fixed {
                spec = spec.fixed();
            }
            ids[slot] = world.registry.add_body(spec)?;
        }

        // Topological order so a reset replays parents before children
        world.layout.clear();
        for &slot in &order {
            let body = &preset.bodies[slot];
            let placement = match &body.orbit {
                Some(orbit) => {
                    let parent = preset.body_index(&orbit.parent).ok_or_else(|| {
                        SimError::InvalidSpec(format!("unknown orbit parent '{}'", orbit.parent))
                    })?;
                    Placement::Orbit {
                        primary: ids[parent],
                        params: orbit.params(),
                    }
                }
                None => Placement::Free {
                    position: body.position,
                    velocity: body.velocity,
                },
            };
            world.layout.push((ids[slot], placement));
        }

        let surface_of = |name: &str| -> Result<BodyId, SimError> {
            preset
                .body_index(name)
                .map(|slot| ids[slot])
                .ok_or_else(|| SimError::InvalidSpec(format!("unknown surface body '{name}'")))
        };

        world.layout.push((
            world.player,
            Placement::Surface {
                anchor: surface_of(&spawn.at.on)?,
                direction: spawn.at.direction(),
                altitude: spawn.at.altitude,
            },
        ));

        for prop in &preset.props {
            let id = world
                .registry
                .add_body(BodySpec::prop(prop.name.clone(), prop.mass, prop.radius))?;
            world.layout.push((
                id,
                Placement::Surface {
                    anchor: surface_of(&prop.at.on)?,
                    direction: prop.at.direction(),
                    altitude: prop.at.altitude,
                },
            ));
        }

        world.apply_layout()?;
        zero_momentum(world.registry.bodies_mut());
        world.settle_player();
        world.sync_camera()?;

        tracing::info!(
            preset = %preset.name,
            bodies = world.registry.len(),
            "world built"
        );
        Ok(world)
    }

    // =========================================================================
    // Loop
    // =========================================================================

    /// Advance the simulation by one rendered frame.
    ///
    /// `render_dt` is scaled by the time scale and added to the accumulator,
    /// which is capped at `fixed_dt * max_substeps`; anything above the cap is
    /// dropped rather than replayed. Returns the number of fixed steps run.
    /// The camera frame is refreshed once, after all steps.
    ///
    /// # Order of operations (per fixed step)
    /// 1. Player movement (writes the player's velocity)
    /// 2. Gravity: kick-drift-kick leapfrog over all bodies
    /// 3. Contacts and grounding (flying player and held prop excluded)
    /// 4. Controller grounded state and camera heading
    /// 5. Grab spring toward the hold point
    /// 6. Clock
    pub fn step(&mut self, render_dt: f64) -> Result<usize, SimError> {
        if self.paused || !render_dt.is_finite() || render_dt <= 0.0 {
            return Ok(0);
        }

        let config = *self.config.get();
        self.accumulator =
            (self.accumulator + render_dt * config.time_scale).min(config.max_backlog());

        let mut steps = 0usize;
        while self.accumulator >= config.fixed_dt && steps < config.max_substeps as usize {
            self.fixed_step()?;
            self.accumulator -= config.fixed_dt;
            steps += 1;
        }

        self.sync_camera()?;
        Ok(steps)
    }

    fn fixed_step(&mut self) -> Result<(), SimError> {
        // Re-read every step; edits between frames apply immediately
        let config = *self.config.get();
        let dt = config.fixed_dt;

        // 1. Player movement
        let view = self.view_frame()?;
        self.controller.update(
            dt,
            &self.input,
            &view,
            &mut self.registry,
            &config.movement,
        )?;

        // 2. Gravity
        self.last_stats = step_leapfrog(self.registry.bodies_mut(), dt, &config.gravity);

        // 3. Contacts
        let mut excluded = Vec::with_capacity(2);
        if self.controller.is_flying() {
            excluded.push(self.player);
        }
        if let Some(held) = self.grab.grabbed() {
            excluded.push(held);
        }
        self.last_contacts = resolve_contacts(self.registry.bodies_mut(), &config.contact, &excluded);

        // 4. Grounding
        let grounded = !self.controller.is_flying() && self.last_contacts.is_grounded(self.player);
        self.controller.set_grounded(grounded, &config.movement);
        self.look.align_to(self.controller.up_vector());

        // 5. Grab
        if self.grab.is_holding() {
            let view = self.view_frame()?;
            let anchor_velocity = self.registry.body(self.player)?.velocity;
            self.grab
                .update(dt, &view, anchor_velocity, &mut self.registry);
        }

        // 6. Clock
        self.clock.advance(dt);

        if self.last_stats.degenerate_pairs > 0 || self.last_contacts.skipped_pairs > 0 {
            tracing::debug!(
                tick = self.clock.tick,
                degenerate = self.last_stats.degenerate_pairs,
                skipped = self.last_contacts.skipped_pairs,
                "numeric guards tripped"
            );
        }
        Ok(())
    }

    /// Halt stepping. All state is preserved.
    pub fn pause(&mut self) {
        if !self.paused {
            tracing::info!(tick = self.clock.tick, "simulation paused");
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            tracing::info!(tick = self.clock.tick, "simulation resumed");
        }
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn clock(&self) -> SimClock {
        self.clock
    }

    /// Stats from the most recent gravity step.
    pub fn last_step_stats(&self) -> StepStats {
        self.last_stats
    }

    /// Contacts and grounding from the most recent step.
    pub fn last_contacts(&self) -> &ResolveReport {
        &self.last_contacts
    }

    // =========================================================================
    // Bodies
    // =========================================================================

    /// Register a body. Its starting state is what a reset restores.
    pub fn add_body(&mut self, spec: BodySpec) -> Result<BodyId, SimError> {
        let placement = Placement::Free {
            position: spec.position,
            velocity: spec.velocity,
        };
        let id = self.registry.add_body(spec)?;
        self.layout.push((id, placement));
        Ok(id)
    }

    /// Remove a body. The player body cannot be removed.
    ///
    /// Bodies placed relative to the removed one keep their current state as
    /// their new reset state.
    pub fn remove_body(&mut self, id: BodyId) -> Result<Body, SimError> {
        if id == self.player {
            return Err(SimError::ProtectedBody(id));
        }
        let removed = self.registry.remove_body(id)?;
        self.grab.forget(id);

        self.layout.retain(|(body, _)| *body != id);
        for (body, placement) in &mut self.layout {
            if placement.depends_on() == Some(id)
                && let Some(current) = self.registry.get_body(*body)
            {
                *placement = Placement::Free {
                    position: current.position,
                    velocity: current.velocity,
                };
            }
        }
        Ok(removed)
    }

    pub fn get_body(&self, id: BodyId) -> Result<&Body, SimError> {
        self.registry.body(id)
    }

    pub fn for_each_body<F: FnMut(&Body)>(&self, f: F) {
        self.registry.for_each(f);
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    pub fn player_id(&self) -> BodyId {
        self.player
    }

    /// Live mass edit. Rejects invalid values and edits that leave the
    /// system without positive total mass.
    pub fn set_body_mass(&mut self, id: BodyId, mass: f64) -> Result<(), SimError> {
        let body = self.registry.body(id)?;
        validate_mass(&body.name, mass)?;
        let total = self.registry.total_mass() - body.mass + mass;
        if total <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "setting mass of {id} to {mass} leaves total mass at {total}"
            )));
        }
        self.registry.body_mut(id)?.mass = mass;
        Ok(())
    }

    pub fn set_body_radius(&mut self, id: BodyId, radius: f64) -> Result<(), SimError> {
        let body = self.registry.body_mut(id)?;
        validate_radius(&body.name, radius)?;
        body.radius = radius;
        Ok(())
    }

    /// Place `satellite` on a circular orbit around `primary` now, and on
    /// every later reset.
    pub fn place_orbit(
        &mut self,
        primary: BodyId,
        satellite: BodyId,
        params: OrbitParams,
    ) -> Result<(), SimError> {
        if primary == satellite {
            return Err(SimError::InvalidSpec(format!("{satellite} cannot orbit itself")));
        }
        let g = self.config.get().gravity.g;
        place_orbit(&mut self.registry, primary, satellite, &params, g)?;
        self.set_placement(satellite, Placement::Orbit { primary, params });
        Ok(())
    }

    /// Cancel net momentum through the most massive body.
    pub fn zero_momentum(&mut self) -> Option<BodyId> {
        zero_momentum(self.registry.bodies_mut())
    }

    /// Drop a prop `distance` ahead of the camera, moving with the player.
    pub fn spawn_prop_in_front(&mut self, spec: BodySpec, distance: f64) -> Result<BodyId, SimError> {
        let view = self.view_frame()?;
        let position = view.point_ahead(distance);
        let velocity = self.registry.body(self.player)?.velocity;

        let id = self.registry.add_body(BodySpec {
            kind: BodyKind::Prop,
            ..spec.at(position).moving(velocity)
        })?;

        let placement = match nearest_surface(self.registry.bodies(), position) {
            Some(anchor) => Placement::Anchored {
                anchor: anchor.id,
                offset: position - anchor.position,
            },
            None => Placement::Free { position, velocity },
        };
        self.layout.push((id, placement));
        tracing::info!(body = %id, "prop spawned");
        Ok(id)
    }

    /// Put every body back at its recorded placement using the current
    /// masses and G, zero momentum, and clear transient player state.
    /// Body ids are kept.
    pub fn reset_orbits(&mut self) -> Result<(), SimError> {
        self.grab.release(None, &mut self.registry);
        self.apply_layout()?;
        zero_momentum(self.registry.bodies_mut());

        self.accumulator = 0.0;
        self.input = MovementInput::default();
        self.settle_player();
        if let Ok(player) = self.registry.body_mut(self.player) {
            player.gravity_coupled = true;
        }
        self.sync_camera()?;

        tracing::info!(tick = self.clock.tick, "orbits reset");
        Ok(())
    }

    fn set_placement(&mut self, id: BodyId, placement: Placement) {
        match self.layout.iter_mut().find(|(body, _)| *body == id) {
            Some(entry) => entry.1 = placement,
            None => self.layout.push((id, placement)),
        }
    }

    /// Replay the layout, placing every body after the one it depends on.
    fn apply_layout(&mut self) -> Result<(), SimError> {
        let g = self.config.get().gravity.g;
        let laid_out: HashSet<BodyId> = self.layout.iter().map(|(id, _)| *id).collect();
        let mut placed = HashSet::with_capacity(laid_out.len());
        let mut pending = self.layout.clone();

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for (id, placement) in pending {
                let waiting = placement
                    .depends_on()
                    .is_some_and(|dep| laid_out.contains(&dep) && !placed.contains(&dep));
                if waiting {
                    deferred.push((id, placement));
                    continue;
                }
                self.place(id, &placement, g)?;
                placed.insert(id);
            }
            if deferred.len() == before {
                return Err(SimError::InvalidSpec(format!(
                    "placement cycle through {} bodies",
                    deferred.len()
                )));
            }
            pending = deferred;
        }
        Ok(())
    }

    fn place(&mut self, id: BodyId, placement: &Placement, g: f64) -> Result<(), SimError> {
        match *placement {
            Placement::Free { position, velocity } => {
                let body = self.registry.body_mut(id)?;
                body.position = position;
                body.velocity = velocity;
            }
            Placement::Orbit { primary, params } => {
                place_orbit(&mut self.registry, primary, id, &params, g)?;
            }
            Placement::Surface {
                anchor,
                direction,
                altitude,
            } => {
                let anchor = self.registry.body(anchor)?.clone();
                let body = self.registry.body_mut(id)?;
                body.position = anchor.position + direction * (anchor.radius + body.radius + altitude);
                body.velocity = anchor.velocity;
            }
            Placement::Anchored { anchor, offset } => {
                let anchor = self.registry.body(anchor)?.clone();
                let body = self.registry.body_mut(id)?;
                body.position = anchor.position + offset;
                body.velocity = anchor.velocity;
            }
        }
        self.registry.body_mut(id)?.acceleration = DVec3::ZERO;
        Ok(())
    }

    /// Re-seed the controller and look from the player's current position.
    fn settle_player(&mut self) {
        let up = self
            .registry
            .get_body(self.player)
            .and_then(|player| {
                nearest_surface(self.registry.bodies(), player.position)
                    .map(|surface| normalize_or(player.position - surface.position, FALLBACK_UP).dir)
            })
            .unwrap_or(FALLBACK_UP);
        self.controller.reset(up);
        self.look.reset_orientation();
        self.look.align_to(up);
    }

    // =========================================================================
    // Config
    // =========================================================================

    pub fn config(&self) -> &SimConfig {
        self.config.get()
    }

    /// Apply a partial config edit. Rejected edits leave the current config
    /// in effect.
    pub fn set_config(&mut self, patch: &ConfigPatch) -> Result<SimConfig, SimError> {
        self.config.apply(patch).copied()
    }

    pub fn subscribe_config(&mut self, listener: impl FnMut(&SimConfig) + 'static) {
        self.config.subscribe(listener);
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Id, position and velocity of every body, in registry order.
    pub fn get_snapshot(&self) -> Vec<BodySnapshot> {
        self.registry.iter().map(BodySnapshot::from).collect()
    }

    pub fn positions_flat(&self) -> Vec<f64> {
        positions_flat(self.registry.bodies())
    }

    pub fn instances(&self) -> Vec<BodyInstance> {
        self.registry.iter().map(BodyInstance::from).collect()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::measure(self.registry.bodies(), &self.config.get().gravity)
    }

    pub fn world_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            version: SNAPSHOT_VERSION,
            time: self.clock.time,
            tick: self.clock.tick,
            config: *self.config.get(),
            bodies: self.registry.bodies().to_vec(),
        }
    }

    /// Restore body state and config from a snapshot of this world.
    ///
    /// Every snapshot body must already exist here; nothing changes unless
    /// the whole snapshot is acceptable.
    pub fn apply_snapshot(&mut self, snapshot: &WorldSnapshot) -> Result<(), SimError> {
        snapshot.config.validate()?;
        for saved in &snapshot.bodies {
            self.registry.body(saved.id)?;
            validate_mass(&saved.name, saved.mass)?;
            validate_radius(&saved.name, saved.radius)?;
        }

        self.grab.release(None, &mut self.registry);
        self.config.replace(snapshot.config)?;
        for saved in &snapshot.bodies {
            let body = self.registry.body_mut(saved.id)?;
            body.mass = saved.mass;
            body.radius = saved.radius;
            body.position = saved.position;
            body.velocity = saved.velocity;
            body.acceleration = saved.acceleration;
            body.fixed = saved.fixed;
            // A prop held when the snapshot was taken comes back free
            body.gravity_coupled = true;
        }
        let walking = self.controller.mode() == MovementMode::Walking;
        self.registry.body_mut(self.player)?.gravity_coupled = walking;

        self.clock = SimClock {
            time: snapshot.time,
            tick: snapshot.tick,
        };
        self.accumulator = 0.0;
        self.sync_camera()
    }

    // =========================================================================
    // Player and camera
    // =========================================================================

    pub fn controller(&self) -> &PlayerMovementController {
        &self.controller
    }

    pub fn grab(&self) -> &GrabSubsystem {
        &self.grab
    }

    /// Latch the movement input used by the following steps.
    pub fn movement_input(&mut self, input: MovementInput) {
        self.input = input;
    }

    pub fn toggle_flight(&mut self) -> Result<MovementMode, SimError> {
        self.controller.toggle_flight(&mut self.registry)
    }

    /// Mouse look in pixels.
    pub fn look(&mut self, dx: f64, dy: f64) {
        self.look.apply_mouse_delta(dx, dy);
    }

    /// Camera frame as of the end of the last frame.
    pub fn camera(&self) -> &CameraFrame {
        &self.camera
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.camera_mode
    }

    /// Drive the camera from outside (spectator, cutscene).
    pub fn set_camera(&mut self, frame: CameraFrame) {
        self.camera = frame;
        self.camera_mode = CameraMode::External;
    }

    /// Return to the first-person camera.
    pub fn follow_player(&mut self) -> Result<(), SimError> {
        self.camera_mode = CameraMode::FirstPerson;
        self.sync_camera()
    }

    /// Pick a prop along `ray`.
    pub fn try_grab(&mut self, ray: &Ray, max_distance: f64) -> Option<BodyId> {
        let config = self.config.get().grab;
        self.grab
            .try_grab(ray, max_distance, &mut self.registry, &config)
    }

    /// Pick along the camera's center ray at the configured reach.
    pub fn grab_from_camera(&mut self) -> Option<BodyId> {
        let ray = self.view_frame().ok()?.center_ray();
        let reach = self.config.get().grab.grab_distance;
        self.try_grab(&ray, reach)
    }

    /// Let go of the held prop, optionally adding `impulse` to its velocity.
    pub fn release(&mut self, impulse: Option<DVec3>) -> Option<BodyId> {
        self.grab.release(impulse, &mut self.registry)
    }

    pub fn release_with_throw(&mut self) -> Option<BodyId> {
        let view = self.view_frame().ok()?;
        let config = self.config.get().grab;
        self.grab
            .release_with_throw(&view, &config, &mut self.registry)
    }

    /// Camera frame for the current state.
    fn view_frame(&self) -> Result<CameraFrame, SimError> {
        match self.camera_mode {
            CameraMode::External => Ok(self.camera),
            CameraMode::FirstPerson => {
                let player = self.registry.body(self.player)?;
                let eye = self
                    .controller
                    .eye_position(player.position, &self.config.get().movement);
                Ok(self.look.frame(eye, self.controller.up_vector()))
            }
        }
    }

    fn sync_camera(&mut self) -> Result<(), SimError> {
        self.camera = self.view_frame()?;
        Ok(())
    }
}

impl std::fmt::Debug for GravityWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GravityWorld")
            .field("bodies", &self.registry.len())
            .field("player", &self.player)
            .field("mode", &self.controller.mode())
            .field("paused", &self.paused)
            .field("clock", &self.clock)
            .finish()
    }
}
