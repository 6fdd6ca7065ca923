//! End-to-end movement scenarios and properties, driven through the public
//! `PhysicsManager` API.

use proptest::prelude::*;

use sector_physics::physics::horizontal::substep_count;
use sector_physics::physics::{LineOpening, MoveDirection};
use sector_physics::world::{Blocker, PlaneType, Sector, SectorId};
use sector_physics::{
    EntityDefinition, EntityId, PhysicsConfig, PhysicsManager, RoomLevelBuilder, SectorMoveRequest,
    SectorMoveStatus, Vec2, Vec3, World,
};

fn room(floor: f64, ceiling: f64) -> World {
    let mut builder = RoomLevelBuilder::new("scenario");
    builder.add_room(Vec2::new(0.0, 0.0), Vec2::new(512.0, 512.0), floor, ceiling);
    World::from_level(&builder.build().unwrap(), &PhysicsConfig::default()).unwrap()
}

fn floor_request(direction: MoveDirection, speed: f64, dest_z: f64) -> SectorMoveRequest {
    SectorMoveRequest {
        sector: SectorId(0),
        plane: PlaneType::Floor,
        direction,
        speed,
        dest_z,
        crush: None,
    }
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn test_non_slider_stops_at_wall() {
    let mut world = room(0.0, 128.0);
    let mut physics = PhysicsManager::default();
    let id = physics.spawn(&mut world, &EntityDefinition::monster(16.0, 56.0), Vec3::new(460.0, 256.0, 0.0), 0.0, None);
    world.entity_mut(id).unwrap().velocity = Vec3::new(60.0, 0.0, 0.0);

    physics.move_entity(&mut world, id);

    let entity = world.entity(id).unwrap();
    // 460 -> 475 -> 490, the third 15-unit substep would cross x = 512
    assert_eq!(entity.position.x, 490.0);
    assert_eq!(entity.velocity.x, 0.0);
    assert!(entity.box2().max.x < 512.0);
    assert!(matches!(entity.blocking, Some(Blocker::Line(_))));
}

#[test]
fn test_slider_follows_wall() {
    let mut world = room(0.0, 128.0);
    let mut physics = PhysicsManager::default();
    let id = physics.spawn(&mut world, &EntityDefinition::player(), Vec3::new(480.0, 100.0, 0.0), 0.0, Some(0));
    world.entity_mut(id).unwrap().velocity = Vec3::new(20.0, 20.0, 0.0);

    physics.move_entity(&mut world, id);

    let entity = world.entity(id).unwrap();
    let friction = physics.config().friction;
    // Travel along the wall covers the full step; nothing goes into the wall
    assert!((entity.position.y - 120.0).abs() < 1e-9);
    assert!(entity.box2().max.x < 512.0);
    assert_eq!(entity.velocity.x, 0.0);
    assert!((entity.velocity.y - 20.0 * friction).abs() < 1e-9);
}

#[test]
fn test_empty_floor_lowers_to_destination() {
    let mut world = room(64.0, 256.0);
    let mut physics = PhysicsManager::default();

    let status = physics.move_sector_z(&mut world, &floor_request(MoveDirection::Down, 8.0, 56.0));
    assert_eq!(status, SectorMoveStatus::Success);
    assert_eq!(world.sector(SectorId(0)).floor.z, 56.0);
}

#[test]
fn test_ceiling_blocked_by_actor() {
    let mut world = room(0.0, 128.0);
    let mut physics = PhysicsManager::default();
    let id = physics.spawn(&mut world, &EntityDefinition::monster(20.0, 56.0), Vec3::new(256.0, 256.0, 0.0), 0.0, None);

    let request = SectorMoveRequest {
        sector: SectorId(0),
        plane: PlaneType::Ceiling,
        direction: MoveDirection::Down,
        speed: 128.0,
        dest_z: 40.0,
        crush: None,
    };
    assert_eq!(physics.move_sector_z(&mut world, &request), SectorMoveStatus::Blocked);

    let ceiling = world.sector(SectorId(0)).ceiling.z;
    assert!(ceiling > 40.0 && ceiling < 128.0);
    assert_eq!(ceiling, 56.0);
    assert_eq!(world.entity(id).unwrap().position.z, 0.0);
}

#[test]
fn test_stacked_actors_ride_floor() {
    let mut world = room(0.0, 256.0);
    let mut physics = PhysicsManager::default();
    let lower = physics.spawn(&mut world, &EntityDefinition::monster(20.0, 56.0), Vec3::new(256.0, 256.0, 0.0), 0.0, None);
    let upper = physics.spawn(&mut world, &EntityDefinition::monster(20.0, 56.0), Vec3::new(266.0, 256.0, 56.0), 0.0, None);
    assert_eq!(world.entity(upper).unwrap().on_entity, Some(lower));

    let status = physics.move_sector_z(&mut world, &floor_request(MoveDirection::Up, 8.0, 8.0));
    assert_eq!(status, SectorMoveStatus::Success);

    let lower = world.entity(lower).unwrap();
    let upper = world.entity(upper).unwrap();
    assert_eq!(lower.bottom(), 8.0);
    assert_eq!(upper.bottom(), lower.top());
}

#[test]
fn test_stacked_actors_ride_fast_floor() {
    let mut world = room(0.0, 256.0);
    let mut physics = PhysicsManager::default();
    let lower = physics.spawn(&mut world, &EntityDefinition::monster(20.0, 56.0), Vec3::new(256.0, 256.0, 0.0), 0.0, None);
    let upper = physics.spawn(&mut world, &EntityDefinition::monster(20.0, 56.0), Vec3::new(266.0, 256.0, 56.0), 0.0, None);

    // Faster than the step height in one tick
    let status = physics.move_sector_z(&mut world, &floor_request(MoveDirection::Up, 32.0, 32.0));
    assert_eq!(status, SectorMoveStatus::Success);
    assert_eq!(world.sector(SectorId(0)).floor.z, 32.0);

    let lower_entity = world.entity(lower).unwrap();
    let upper_entity = world.entity(upper).unwrap();
    assert_eq!(lower_entity.bottom(), 32.0);
    assert_eq!(upper_entity.bottom(), 88.0);
    assert_eq!(upper_entity.bottom(), lower_entity.top());
    assert_eq!(upper_entity.on_entity, Some(lower));
}

#[test]
fn test_no_clip_actor_ignored_by_ceiling() {
    let mut world = room(0.0, 128.0);
    let mut physics = PhysicsManager::default();
    let mut def = EntityDefinition::monster(20.0, 56.0);
    def.flags.no_clip = true;
    let id = physics.spawn(&mut world, &def, Vec3::new(256.0, 256.0, 0.0), 0.0, None);
    assert!(!world.sector(SectorId(0)).entities.contains(&id));

    let request = SectorMoveRequest {
        sector: SectorId(0),
        plane: PlaneType::Ceiling,
        direction: MoveDirection::Down,
        speed: 128.0,
        dest_z: 40.0,
        crush: None,
    };
    assert_eq!(physics.move_sector_z(&mut world, &request), SectorMoveStatus::Success);
    assert_eq!(world.sector(SectorId(0)).ceiling.z, 40.0);
    assert!(physics.take_events().is_empty());
}

// =============================================================================
// DETERMINISM
// =============================================================================

fn scripted_run() -> [u8; 32] {
    let mut world = room(0.0, 128.0);
    let mut physics = PhysicsManager::default();

    let ids: Vec<EntityId> = (0..6)
        .map(|i| {
            let at = Vec3::new(64.0 + 70.0 * i as f64, 64.0 + 50.0 * i as f64, 0.0);
            let def = if i % 2 == 0 { EntityDefinition::player() } else { EntityDefinition::monster(20.0, 56.0) };
            physics.spawn(&mut world, &def, at, 0.0, (i % 2 == 0).then_some(i as u8))
        })
        .collect();

    for t in 0..200u32 {
        for (i, &id) in ids.iter().enumerate() {
            let angle = ((t as usize * (i + 3) * 11) % 360) as f64;
            world.entity_mut(id).unwrap().velocity.set_xy(Vec2::from_angle(angle.to_radians()) * 12.0);
        }
        physics.tick(&mut world);
        if t % 40 == 0 {
            let dest = if (t / 40) % 2 == 0 { 16.0 } else { 0.0 };
            let direction = if dest > 0.0 { MoveDirection::Up } else { MoveDirection::Down };
            physics.move_sector_z(&mut world, &floor_request(direction, 16.0, dest));
        }
        physics.take_events();
    }

    world.compute_hash()
}

#[test]
fn test_replay_hash_matches() {
    assert_eq!(scripted_run(), scripted_run());
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn prop_substeps_never_exceed_radius(
        radius in 1.0f64..64.0,
        vx in -300.0f64..300.0,
        vy in -300.0f64..300.0,
    ) {
        let velocity = Vec2::new(vx, vy);
        let count = substep_count(velocity, radius);
        let step = velocity / count as f64;
        prop_assert!(step.max_abs_component() <= radius - 0.5 + 1e-9);
    }

    #[test]
    fn prop_step_up_matches_step_height(ledge in 0u32..64) {
        let ledge = ledge as f64;
        let opening = LineOpening::new(
            &Sector::new(SectorId(0), 0.0, 256.0),
            &Sector::new(SectorId(1), ledge, 256.0),
        );
        let player = sector_physics::Entity::new(
            EntityId(0),
            &EntityDefinition::player(),
            Vec3::new(0.0, 0.0, 0.0),
            0.0,
            Some(0),
        );
        prop_assert_eq!(opening.can_pass_or_step_through(&player), ledge <= 24.0);
    }

    #[test]
    fn prop_slide_is_parallel_and_slowed(vx in 5.0f64..15.0, vy in 1.0f64..15.0, down in any::<bool>()) {
        let mut world = room(0.0, 128.0);
        let mut physics = PhysicsManager::default();
        let id = physics.spawn(&mut world, &EntityDefinition::player(), Vec3::new(495.0, 256.0, 0.0), 0.0, Some(0));
        let vy = if down { -vy } else { vy };
        world.entity_mut(id).unwrap().velocity = Vec3::new(vx, vy, 0.0);
        let before = Vec2::new(vx, vy).length();

        physics.move_entity(&mut world, id);

        let entity = world.entity(id).unwrap();
        let after = entity.velocity.xy();
        // The east wall runs along y
        prop_assert_eq!(after.x, 0.0);
        prop_assert!(after.length() <= before * physics.config().friction + 1e-9);
        prop_assert!(entity.box2().max.x < 512.0);
    }

    #[test]
    fn prop_blocked_floor_rolls_back_together(
        ceiling in 64u32..128,
        heights in prop::collection::vec(16u32..64, 1..5),
        dest in 1u32..64,
    ) {
        let ceiling = ceiling as f64;
        let mut world = room(0.0, ceiling);
        let mut physics = PhysicsManager::default();

        let ids: Vec<EntityId> = heights
            .iter()
            .enumerate()
            .map(|(i, &h)| {
                let def = EntityDefinition::monster(20.0, (h as f64).min(ceiling));
                physics.spawn(&mut world, &def, Vec3::new(40.0 + 60.0 * i as f64, 256.0, 0.0), 0.0, None)
            })
            .collect();
        let before: Vec<f64> = ids.iter().map(|id| world.entity(*id).unwrap().position.z).collect();

        let status = physics.move_sector_z(&mut world, &floor_request(MoveDirection::Up, 64.0, dest as f64));
        if status == SectorMoveStatus::Blocked {
            let delta = world.sector(SectorId(0)).floor.z;
            prop_assert!(delta >= 0.0 && delta < dest as f64);
            for (id, z) in ids.iter().zip(before) {
                prop_assert_eq!(world.entity(*id).unwrap().position.z, z + delta);
            }
        } else {
            prop_assert_eq!(world.sector(SectorId(0)).floor.z, dest as f64);
        }
    }
}
