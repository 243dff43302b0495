//! Controller Tests - Grounding, Up-Vector Smoothing and Walking
//!
//! Tests for the contact resolver's grounding report and for the
//! surface-relative movement controller driven through a full world.

use glam::DVec3;
use gravwalk_engine::camera::CameraFrame;
use gravwalk_engine::input::MovementInput;
use gravwalk_engine::physics::vector::angle_between;
use gravwalk_engine::physics::{
    BodyRegistry, BodySpec, ContactConfig, GravityConfig, resolve_contacts, step_leapfrog,
};
use gravwalk_engine::player::{MovementConfig, MovementMode, PlayerMovementController};
use gravwalk_engine::world::{GravityWorld, SimConfig};

const DT: f64 = 1.0 / 120.0;

/// Fixed planet (surface gravity 10) with the player resting on top.
fn planet_world() -> (GravityWorld, gravwalk_engine::BodyId) {
    let mut world = GravityWorld::new(
        SimConfig::default(),
        BodySpec::player(1.0, 0.5).at(DVec3::new(0.0, 10.55, 0.0)),
    )
    .unwrap();
    let planet = world
        .add_body(BodySpec::massive("Terra", 1000.0, 10.0).fixed())
        .unwrap();
    (world, planet)
}

fn settle(world: &mut GravityWorld, seconds: f64) {
    let frames = (seconds * 60.0).round() as usize;
    for _ in 0..frames {
        world.step(1.0 / 60.0).unwrap();
    }
}

// ============================================================================
// Grounding
// ============================================================================

#[test]
fn test_massless_body_grounds_and_settles() {
    let contact = ContactConfig::default();
    let gravity = GravityConfig::default();
    let mut registry = BodyRegistry::new();
    let planet = registry
        .add_body(BodySpec::massive("planet", 1000.0, 10.0).fixed())
        .unwrap();
    let start_height = 10.0 + 0.5 + 1.5 * contact.ground_epsilon;
    let pebble = registry
        .add_body(BodySpec::prop("pebble", 0.0, 0.5).at(DVec3::new(0.0, start_height, 0.0)))
        .unwrap();

    let mut grounded_at = None;
    for step in 0..600 {
        step_leapfrog(registry.bodies_mut(), DT, &gravity);
        let report = resolve_contacts(registry.bodies_mut(), &contact, &[]);
        if grounded_at.is_none() && report.is_grounded(pebble) {
            grounded_at = Some(step);
            assert_eq!(report.ground_of(pebble).unwrap().surface, planet);
        }
    }
    let grounded_at = grounded_at.expect("pebble never grounded");
    assert!(grounded_at < 240, "grounded only after {grounded_at} steps");

    let body = registry.body(pebble).unwrap();
    let penetration = 10.5 - body.position.length();
    assert!(penetration < contact.ground_epsilon);
    assert!(body.velocity.length() < contact.grounded_speed);
}

#[test]
fn test_player_grounds_in_world() {
    let (mut world, planet) = planet_world();
    settle(&mut world, 0.5);
    assert!(world.controller().is_grounded());
    assert_eq!(world.controller().nearest_body(), Some(planet));
    let player = world.get_body(world.player_id()).unwrap();
    assert!((player.position.length() - 10.5).abs() < 0.05);
}

// ============================================================================
// Up vector
// ============================================================================

#[test]
fn test_up_vector_turns_smoothly_between_bodies() {
    let config = MovementConfig::default();
    let mut registry = BodyRegistry::new();
    registry
        .add_body(BodySpec::massive("west", 1000.0, 10.0).at(DVec3::new(-50.0, 0.0, 0.0)).fixed())
        .unwrap();
    registry
        .add_body(BodySpec::massive("east", 1000.0, 10.0).at(DVec3::new(50.0, 0.0, 0.0)).fixed())
        .unwrap();
    let start = DVec3::new(-35.0, 5.0, 0.0);
    let end = DVec3::new(35.0, 5.0, 0.0);
    let player = registry.add_body(BodySpec::player(1.0, 0.5).at(start)).unwrap();

    let mut controller = PlayerMovementController::new(player, DVec3::X);
    let camera = CameraFrame::default();
    let input = MovementInput::default();

    let t = config.align_rate * DT;
    let bound = (t / (1.0 - t)).asin() + 1e-9;

    let steps = 700;
    let mut worst = 0.0_f64;
    for i in 0..=steps {
        let along = i as f64 / steps as f64;
        registry.body_mut(player).unwrap().position = start.lerp(end, along);
        let before = controller.up_vector();
        controller
            .update(DT, &input, &camera, &mut registry, &config)
            .unwrap();
        worst = worst.max(angle_between(before, controller.up_vector()));
    }
    assert!(worst <= bound, "up vector jumped {worst} rad (bound {bound})");

    // Ends up standing on the east body
    for _ in 0..240 {
        controller
            .update(DT, &input, &camera, &mut registry, &config)
            .unwrap();
    }
    assert!(controller.up_vector().x < -0.9);
}

#[test]
fn test_up_vector_follows_player_around_planet() {
    let (mut world, _) = planet_world();
    settle(&mut world, 0.5);
    world.movement_input(MovementInput::new(0.0, 0.0, 1.0));
    settle(&mut world, 1.0);

    let player = world.get_body(world.player_id()).unwrap();
    let radial = player.position.normalize();
    assert!(world.controller().up_vector().dot(radial) > 0.99);
    // Walked toward -Z along the surface
    assert!(player.position.z < -2.0);
    assert!((player.position.length() - 10.5).abs() < 0.3);
}

// ============================================================================
// Walking and jumping
// ============================================================================

#[test]
fn test_walk_speed_relative_to_surface() {
    let (mut world, _) = planet_world();
    settle(&mut world, 0.5);
    world.movement_input(MovementInput::new(1.0, 0.0, 0.0));
    settle(&mut world, 1.0);

    let player = world.get_body(world.player_id()).unwrap();
    let up = world.controller().up_vector();
    let tangential = player.velocity - up * player.velocity.dot(up);
    let walk = world.config().movement.walk_speed;
    assert!((tangential.length() - walk).abs() < 0.5, "speed {}", tangential.length());
}

#[test]
fn test_jump_leaves_ground_and_lands() {
    let (mut world, _) = planet_world();
    settle(&mut world, 0.5);
    assert!(world.controller().can_jump());

    world.movement_input(MovementInput::default().with_jump());
    world.step(1.0 / 120.0).unwrap();
    world.movement_input(MovementInput::default());
    assert!(!world.controller().is_grounded());

    let mut peak = 0.0_f64;
    for _ in 0..300 {
        world.step(1.0 / 60.0).unwrap();
        let altitude = world.get_body(world.player_id()).unwrap().position.length() - 10.5;
        peak = peak.max(altitude);
    }
    // v^2 / 2 = GM (1/r0 - 1/r1) puts the apex near r1 = 15.8
    assert!(peak > 4.5 && peak < 6.0, "peak {peak}");
    assert!(world.controller().is_grounded());
}

#[test]
fn test_coyote_time_allows_late_jump() {
    let config = MovementConfig::default();
    let mut controller = PlayerMovementController::new(gravwalk_engine::BodyId(0), DVec3::Y);
    controller.set_grounded(true, &config);
    controller.set_grounded(false, &config);
    assert!(controller.can_jump());
    assert!(controller.coyote_time_remaining() > 0.0);
}

// ============================================================================
// Flight
// ============================================================================

#[test]
fn test_flight_toggle_decouples_gravity() {
    let (mut world, _) = planet_world();
    settle(&mut world, 0.5);

    assert_eq!(world.toggle_flight().unwrap(), MovementMode::Flying);
    let player_id = world.player_id();
    assert!(!world.get_body(player_id).unwrap().gravity_coupled);

    world.movement_input(MovementInput::new(0.0, 1.0, 0.0));
    settle(&mut world, 1.0);
    let height = world.get_body(player_id).unwrap().position.length();
    assert!(height > 12.0, "flew to {height}");

    // Idle flight damps toward rest
    world.movement_input(MovementInput::default());
    settle(&mut world, 3.0);
    assert!(world.get_body(player_id).unwrap().velocity.length() < 0.5);

    assert_eq!(world.toggle_flight().unwrap(), MovementMode::Walking);
    assert!(world.get_body(player_id).unwrap().gravity_coupled);
}
