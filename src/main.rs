//! Sector Physics Demo
//!
//! Runs a short deterministic simulation over a level (a built-in one, or a
//! JSON file given as the first argument), then replays it and checks that
//! both runs end with the same state hash.
//!
//! ```text
//! sector-physics [level.json] [config.json]
//! ```

use std::fs;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sector_physics::{
    PhysicsConfig, PhysicsEvent, PhysicsManager, RoomLevelBuilder, SectorMoveRequest, SectorMoveStatus, VERSION,
    Vec2, Vec3, World, EntityDefinition, LevelData,
    physics::{MoveDirection, ActivationContext},
    world::{LineActivation, LineSpecial, PlaneType, SectorId},
};

/// Ticks per demo run (35 Hz, 20 seconds)
const DEMO_TICKS: u64 = 700;

/// Sector tag of the demo lift
const LIFT_TAG: u32 = 1;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Sector Physics v{}", VERSION);

    let mut args = std::env::args().skip(1);
    let level = match args.next() {
        Some(path) => {
            let json = fs::read_to_string(&path).with_context(|| format!("reading level {path}"))?;
            LevelData::from_json(&json).with_context(|| format!("parsing level {path}"))?
        }
        None => demo_level()?,
    };
    let config = match args.next() {
        Some(path) => {
            let json = fs::read_to_string(&path).with_context(|| format!("reading config {path}"))?;
            PhysicsConfig::from_json(&json).with_context(|| format!("parsing config {path}"))?
        }
        None => PhysicsConfig::default(),
    };

    info!(
        "Level '{}': {} sectors, {} lines",
        level.name,
        level.sectors.len(),
        level.lines.len()
    );

    // Demo: run the simulation
    info!("=== Running {} ticks ===", DEMO_TICKS);
    let (world, events) = run_demo(&level, &config)?;
    let hash = world.compute_hash();

    for entity in world.entities.values() {
        info!(
            "{} #{}: ({:.2}, {:.2}, {:.2}) sector {}",
            entity.name, entity.id.0, entity.position.x, entity.position.y, entity.position.z, entity.sector.0
        );
    }
    info!("Events: {}", events);
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let (replay, _) = run_demo(&level, &config)?;
    let replay_hash = replay.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        info!("DETERMINISM FAILURE: Hashes differ!");
    }

    Ok(())
}

/// Three rooms in a row; the last is a lift, and a walk-over line in the
/// doorway before it is tagged to start it.
fn demo_level() -> Result<LevelData> {
    let mut builder = RoomLevelBuilder::new("demo");
    let hall = builder.add_room(Vec2::new(0.0, 0.0), Vec2::new(512.0, 384.0), 0.0, 160.0);
    let step = builder.add_room(Vec2::new(512.0, 64.0), Vec2::new(640.0, 320.0), 16.0, 160.0);
    let lift = builder.add_room(Vec2::new(640.0, 64.0), Vec2::new(896.0, 320.0), 16.0, 160.0);

    builder.set_tag(lift, LIFT_TAG)?;
    builder.portal_special(hall, step, LineSpecial {
        kind: 62,
        activation: LineActivation::PlayerCross,
        repeat: true,
        sector_tag: LIFT_TAG,
    })?;

    Ok(builder.build()?)
}

/// Run the demo scenario and return the world plus the number of events.
fn run_demo(level: &LevelData, config: &PhysicsConfig) -> Result<(World, usize)> {
    let mut world = World::from_level(level, config).context("building world")?;
    let mut physics = PhysicsManager::new(config.clone());

    let player = physics.spawn(&mut world, &EntityDefinition::player(), Vec3::new(64.0, 192.0, 0.0), 0.0, Some(0));
    let monsters: Vec<_> = (0..3)
        .map(|i| {
            let at = Vec3::new(160.0 + 96.0 * i as f64, 64.0 + 112.0 * i as f64, 0.0);
            physics.spawn(&mut world, &EntityDefinition::monster(20.0, 56.0), at, 0.0, None)
        })
        .collect();

    let lifts: Vec<SectorId> = world.sectors_with_tag(LIFT_TAG).map(|sector| sector.id).collect();
    let mut lift_direction = MoveDirection::Up;
    let mut lift_running = false;
    let mut total_events = 0;

    for t in 0..DEMO_TICKS {
        // Player walks east and presses use every second
        if let Some(entity) = world.entity_mut(player) {
            entity.velocity.x += 1.5;
            entity.velocity.y = ((t % 70) as f64 - 35.0) * 0.1;
        }
        if t % 35 == 0 {
            physics.entity_use(&mut world, player);
        }

        // Monsters wander on a fixed pattern
        for (i, &id) in monsters.iter().enumerate() {
            if let Some(entity) = world.entity_mut(id) {
                let angle = ((t as usize * (i + 1) * 7) % 360) as f64;
                entity.velocity.set_xy(Vec2::from_angle(angle.to_radians()) * 4.0);
            }
        }

        physics.tick(&mut world);

        if lift_running {
            for &sector in &lifts {
                let dest_z = match lift_direction {
                    MoveDirection::Up => 96.0,
                    MoveDirection::Down => 16.0,
                };
                let request = SectorMoveRequest {
                    sector,
                    plane: PlaneType::Floor,
                    direction: lift_direction,
                    speed: 4.0,
                    dest_z,
                    crush: None,
                };
                let status = physics.move_sector_z(&mut world, &request);
                let arrived = world.sector(sector).floor.z == dest_z;
                if status == SectorMoveStatus::Blocked || arrived {
                    lift_direction = match lift_direction {
                        MoveDirection::Up => MoveDirection::Down,
                        MoveDirection::Down => MoveDirection::Up,
                    };
                }
                if arrived && lift_direction == MoveDirection::Up {
                    physics.stop_sector_move(&mut world, sector);
                    lift_running = false;
                }
            }
        }

        for event in physics.take_events() {
            total_events += 1;
            match event {
                PhysicsEvent::Activation(activation) if activation.context == ActivationContext::CrossLine => {
                    info!("Tick {}: entity {} crossed line {}", t, activation.entity.0, activation.line.0);
                    lift_running = true;
                }
                PhysicsEvent::Activation(activation) => {
                    info!("Tick {}: entity {} used line {}", t, activation.entity.0, activation.line.0);
                }
                PhysicsEvent::UseFailed { .. } => {}
                PhysicsEvent::Crushed { entity, .. } => {
                    info!("Tick {}: entity {} crushed", t, entity.0);
                }
            }
        }
    }

    Ok((world, total_events))
}
