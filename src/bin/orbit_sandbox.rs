//! Orbit Sandbox
//!
//! Headless run of a world preset. Steps the simulation at a fixed render
//! rate and logs conserved quantities so drift is easy to spot.
//!
//! Usage: `orbit-sandbox [preset.json] [seconds]`
//!
//! Set `RUST_LOG=gravwalk=debug` for per-step diagnostics.

use anyhow::{Context, Result};
use gravwalk_engine::world::{GravityWorld, WorldPreset};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Render rate the sandbox pretends to run at.
const FRAME_DT: f64 = 1.0 / 60.0;

/// Simulated seconds between progress reports.
const REPORT_INTERVAL_S: f64 = 10.0;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("gravwalk=info".parse()?)
                .add_directive("orbit_sandbox=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let preset = match args.next() {
        Some(path) => WorldPreset::from_path(&path)
            .with_context(|| format!("loading preset {path}"))?,
        None => WorldPreset::default_system()?,
    };
    let seconds: f64 = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("duration '{raw}' is not a number"))?,
        None => 60.0,
    };

    let mut world = GravityWorld::from_preset(&preset)?;
    let start = world.diagnostics();
    tracing::info!(
        preset = %preset.name,
        bodies = world.registry().len(),
        energy = start.total_energy,
        "sandbox started"
    );

    let frames = (seconds / FRAME_DT).ceil() as u64;
    let mut next_report = REPORT_INTERVAL_S;
    for _ in 0..frames {
        world.step(FRAME_DT)?;

        let clock = world.clock();
        if clock.time >= next_report {
            next_report += REPORT_INTERVAL_S;
            let now = world.diagnostics();
            let drift = if start.total_energy != 0.0 {
                (now.total_energy - start.total_energy) / start.total_energy.abs()
            } else {
                0.0
            };
            tracing::info!(
                time = clock.time,
                tick = clock.tick,
                energy_drift = drift,
                momentum = now.total_momentum.length(),
                grounded = world.controller().is_grounded(),
                "progress"
            );
        }
    }

    for body in world.registry().iter() {
        tracing::info!(
            body = %body.name,
            position = ?body.position,
            speed = body.velocity.length(),
            "final state"
        );
    }
    Ok(())
}
