//! Gravity Tests - Conservation Laws and Numeric Guards
//!
//! Tests for pairwise accelerations and the kick-drift-kick stepper.

use glam::DVec3;
use gravwalk_engine::physics::gravity::{compute_accelerations, pair_contribution, total_momentum};
use gravwalk_engine::physics::{Body, BodyRegistry, BodySpec, GravityConfig, step_leapfrog};

/// Six bodies in an irregular, fully dynamic arrangement.
fn cluster() -> BodyRegistry {
    let mut registry = BodyRegistry::new();
    let seeds = [
        (500.0, DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.1, 0.0, -0.2)),
        (20.0, DVec3::new(40.0, 3.0, -7.0), DVec3::new(0.0, 2.0, 3.0)),
        (35.0, DVec3::new(-25.0, 10.0, 18.0), DVec3::new(-1.5, 0.0, 0.7)),
        (1.0, DVec3::new(5.0, -30.0, 2.0), DVec3::new(3.0, 0.0, 0.0)),
        (0.0, DVec3::new(12.0, 12.0, 12.0), DVec3::ZERO),
        (7.5, DVec3::new(-3.0, 4.0, -60.0), DVec3::new(0.0, -1.0, 1.0)),
    ];
    for (i, (mass, position, velocity)) in seeds.into_iter().enumerate() {
        registry
            .add_body(
                BodySpec::massive(format!("b{i}"), mass, 1.0)
                    .at(position)
                    .moving(velocity),
            )
            .unwrap();
    }
    registry
}

fn momentum_scale(bodies: &[Body]) -> f64 {
    bodies
        .iter()
        .map(|b| b.mass * b.velocity.length())
        .sum::<f64>()
        .max(1.0)
}

// ============================================================================
// Conservation
// ============================================================================

#[test]
fn test_momentum_conserved_across_one_step() {
    let mut registry = cluster();
    let config = GravityConfig::default();
    let before = total_momentum(registry.bodies());
    let scale = momentum_scale(registry.bodies());

    step_leapfrog(registry.bodies_mut(), 1.0 / 120.0, &config);

    let change = (total_momentum(registry.bodies()) - before).length();
    assert!(change / scale < 1e-9, "relative momentum change {}", change / scale);
}

#[test]
fn test_momentum_conserved_over_many_steps() {
    let mut registry = cluster();
    let config = GravityConfig::default();
    let before = total_momentum(registry.bodies());
    let scale = momentum_scale(registry.bodies());

    for _ in 0..500 {
        step_leapfrog(registry.bodies_mut(), 1.0 / 120.0, &config);
    }
    let change = (total_momentum(registry.bodies()) - before).length();
    assert!(change / scale < 1e-9);
}

#[test]
fn test_newtons_third_law_for_every_pair() {
    let registry = cluster();
    let config = GravityConfig::default();
    let bodies = registry.bodies();
    for (i, a) in bodies.iter().enumerate() {
        for b in &bodies[i + 1..] {
            let pair = pair_contribution(a, b, &config).unwrap();
            let force_on_a = pair.on_i * a.mass;
            let force_on_b = pair.on_j * b.mass;
            let scale = force_on_a.length().max(1e-300);
            assert!((force_on_a + force_on_b).length() / scale < 1e-12);
        }
    }
}

#[test]
fn test_acceleration_matches_inverse_square() {
    let mut registry = BodyRegistry::new();
    registry.add_body(BodySpec::massive("m", 1000.0, 1.0)).unwrap();
    let pebble = registry
        .add_body(BodySpec::prop("pebble", 0.0, 0.1).at(DVec3::new(10.0, 0.0, 0.0)))
        .unwrap();
    let config = GravityConfig {
        softening_length: 0.0,
        ..Default::default()
    };
    compute_accelerations(registry.bodies_mut(), &config);
    let a = registry.body(pebble).unwrap().acceleration;
    assert!((a - DVec3::new(-10.0, 0.0, 0.0)).length() < 1e-12);

    // Doubling the distance quarters the pull
    registry.body_mut(pebble).unwrap().position = DVec3::new(20.0, 0.0, 0.0);
    compute_accelerations(registry.bodies_mut(), &config);
    let a = registry.body(pebble).unwrap().acceleration;
    assert!((a - DVec3::new(-2.5, 0.0, 0.0)).length() < 1e-12);
}

// ============================================================================
// Body flags
// ============================================================================

#[test]
fn test_fixed_body_never_moves() {
    let mut registry = BodyRegistry::new();
    let anchor = registry
        .add_body(BodySpec::massive("anchor", 10.0, 1.0).fixed().moving(DVec3::X))
        .unwrap();
    registry
        .add_body(BodySpec::massive("heavy", 1e6, 1.0).at(DVec3::new(5.0, 0.0, 0.0)))
        .unwrap();
    for _ in 0..100 {
        step_leapfrog(registry.bodies_mut(), 1.0 / 120.0, &GravityConfig::default());
    }
    let body = registry.body(anchor).unwrap();
    assert_eq!(body.position, DVec3::ZERO);
    assert_eq!(body.velocity, DVec3::X);
}

#[test]
fn test_uncoupled_body_exerts_but_does_not_receive() {
    let mut registry = BodyRegistry::new();
    let a = registry.add_body(BodySpec::massive("a", 100.0, 1.0)).unwrap();
    let b = registry
        .add_body(BodySpec::massive("b", 100.0, 1.0).at(DVec3::new(10.0, 0.0, 0.0)))
        .unwrap();
    registry.body_mut(a).unwrap().gravity_coupled = false;

    compute_accelerations(registry.bodies_mut(), &GravityConfig::default());
    assert_eq!(registry.body(a).unwrap().acceleration, DVec3::ZERO);
    assert!(registry.body(b).unwrap().acceleration.x < 0.0);
}

// ============================================================================
// Numeric guards
// ============================================================================

#[test]
fn test_coincident_bodies_stay_finite() {
    let mut registry = BodyRegistry::new();
    registry.add_body(BodySpec::massive("a", 100.0, 1.0)).unwrap();
    registry.add_body(BodySpec::massive("b", 100.0, 1.0)).unwrap();

    // Softened: finite (zero) force
    let stats = step_leapfrog(registry.bodies_mut(), 1.0 / 120.0, &GravityConfig::default());
    assert_eq!(stats.degenerate_pairs, 0);

    // Unsoftened: pair is skipped and counted
    let hard = GravityConfig {
        softening_length: 0.0,
        ..Default::default()
    };
    let stats = step_leapfrog(registry.bodies_mut(), 1.0 / 120.0, &hard);
    assert!(stats.degenerate_pairs > 0);
    for body in registry.iter() {
        assert!(body.position.is_finite());
        assert!(body.velocity.is_finite());
    }
}

#[test]
fn test_max_accel_clamps_close_encounters() {
    let mut registry = BodyRegistry::new();
    registry.add_body(BodySpec::massive("a", 1e6, 1.0)).unwrap();
    let pebble = registry
        .add_body(BodySpec::prop("pebble", 1.0, 0.1).at(DVec3::new(1.0, 0.0, 0.0)))
        .unwrap();
    let config = GravityConfig {
        max_accel: Some(50.0),
        ..Default::default()
    };
    let stats = compute_accelerations(registry.bodies_mut(), &config);
    assert!(stats.clamped_bodies >= 1);
    assert!((registry.body(pebble).unwrap().acceleration.length() - 50.0).abs() < 1e-9);
}
