//! Use-Trace
//!
//! A short tracer from the entity's center along its facing. The closest line
//! that is either a usable special or a wall decides the outcome, so a switch
//! behind a closed door cannot be reached.

use tracing::trace;

use crate::config::PhysicsConfig;
use crate::core::geometry::Seg2;
use crate::core::vec::Vec2;
use crate::partition::blockmap::IterationStatus;
use crate::world::entity::Entity;
use crate::world::line::LineId;
use crate::world::World;

use super::events::{EventQueue, PhysicsEvent};
use super::opening::LineOpening;

/// Fire the use tracer. Returns true if a special was activated.
pub fn entity_use(world: &mut World, entity: &Entity, config: &PhysicsConfig, events: &mut EventQueue) -> bool {
    let origin = entity.position.xy();
    let tracer = Seg2::new(origin, origin + Vec2::from_angle(entity.angle) * config.use_distance);

    let mut hits: Vec<(f64, LineId)> = Vec::new();
    world.blockmap.iterate_segment(&tracer, |block| {
        for &line_id in &block.lines {
            if hits.iter().any(|&(_, seen)| seen == line_id) {
                continue;
            }
            if let Some(t) = tracer.intersection_time(&world.line(line_id).segment) {
                hits.push((t, line_id));
            }
        }
        IterationStatus::Continue
    });
    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    for (_, line_id) in hits {
        let line = world.line(line_id);

        let usable = line.special.is_some_and(|special| special.activation.used_by(entity.is_player()))
            && line.special_available()
            && line.segment.on_right(origin);
        if usable {
            trace!(entity = entity.id.0, line = line_id.0, "Line used");
            events.push(PhysicsEvent::use_line(entity.id, line_id, true));
            world.lines[line_id.0 as usize].mark_activated();
            return true;
        }

        let closed = LineOpening::of_line(world, line).map_or(true, |opening| opening.opening_height <= 0.0);
        if closed {
            if entity.is_player() {
                events.push(PhysicsEvent::use_failed(entity.id));
            }
            return false;
        }
    }

    false
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::core::vec::Vec3;
    use crate::physics::linker::link_to_world;
    use crate::world::entity::{EntityDefinition, EntityId};
    use crate::world::line::{LineActivation, LineSpecial};
    use crate::world::{RoomLevelBuilder, WallSide};

    fn switch(activation: LineActivation, repeat: bool) -> LineSpecial {
        LineSpecial {
            kind: 11,
            activation,
            repeat,
            sector_tag: 0,
        }
    }

    fn player(world: &mut World, at: Vec2, angle: f64) -> Entity {
        let id = world.allocate_entity_id();
        let mut entity = Entity::new(id, &EntityDefinition::player(), Vec3::new(at.x, at.y, 0.0), angle, Some(0));
        link_to_world(world, &mut entity, false);
        entity
    }

    fn switch_room(activation: LineActivation, repeat: bool) -> World {
        let mut builder = RoomLevelBuilder::new("switch");
        let room = builder.add_room(Vec2::new(0.0, 0.0), Vec2::new(256.0, 256.0), 0.0, 128.0);
        builder.wall_special(room, WallSide::East, switch(activation, repeat)).unwrap();
        World::from_level(&builder.build().unwrap(), &PhysicsConfig::default()).unwrap()
    }

    #[test]
    fn test_use_switch_in_reach() {
        let mut world = switch_room(LineActivation::PlayerUse, false);
        let entity = player(&mut world, Vec2::new(220.0, 128.0), 0.0);
        let mut events = EventQueue::default();

        assert!(entity_use(&mut world, &entity, &PhysicsConfig::default(), &mut events));
        let fired = events.take();
        assert_eq!(fired.len(), 1);
        assert!(matches!(fired[0], PhysicsEvent::Activation(_)));

        // Non-repeatable: second press hits a plain wall
        assert!(!entity_use(&mut world, &entity, &PhysicsConfig::default(), &mut events));
        assert_eq!(events.take(), vec![PhysicsEvent::use_failed(entity.id)]);
    }

    #[test]
    fn test_use_out_of_reach() {
        let mut world = switch_room(LineActivation::PlayerUse, true);
        let entity = player(&mut world, Vec2::new(100.0, 128.0), 0.0);
        let mut events = EventQueue::default();

        assert!(!entity_use(&mut world, &entity, &PhysicsConfig::default(), &mut events));
        assert!(events.take().is_empty());
    }

    #[test]
    fn test_use_plain_wall_fails_for_player_only() {
        let mut world = switch_room(LineActivation::AnyUse, true);
        let entity = player(&mut world, Vec2::new(30.0, 128.0), PI);
        let mut events = EventQueue::default();

        assert!(!entity_use(&mut world, &entity, &PhysicsConfig::default(), &mut events));
        assert_eq!(events.take(), vec![PhysicsEvent::use_failed(entity.id)]);

        let monster = Entity::new(EntityId(50), &EntityDefinition::monster(20.0, 56.0), Vec3::new(30.0, 128.0, 0.0), PI, None);
        assert!(!entity_use(&mut world, &monster, &PhysicsConfig::default(), &mut events));
        assert!(events.take().is_empty());
    }

    #[test]
    fn test_switch_behind_closed_door_unreachable() {
        let mut builder = RoomLevelBuilder::new("door");
        builder.add_room(Vec2::new(0.0, 0.0), Vec2::new(200.0, 256.0), 0.0, 128.0);
        let door = builder.add_room(Vec2::new(200.0, 0.0), Vec2::new(216.0, 256.0), 0.0, 0.0);
        builder.wall_special(door, WallSide::East, switch(LineActivation::PlayerUse, true)).unwrap();
        let mut world = World::from_level(&builder.build().unwrap(), &PhysicsConfig::default()).unwrap();

        let entity = player(&mut world, Vec2::new(180.0, 128.0), 0.0);
        let mut events = EventQueue::default();
        assert!(!entity_use(&mut world, &entity, &PhysicsConfig::default(), &mut events));
        assert_eq!(events.take(), vec![PhysicsEvent::use_failed(entity.id)]);
    }

    #[test]
    fn test_monster_cannot_use_player_switch() {
        let mut world = switch_room(LineActivation::PlayerUse, true);
        let monster = Entity::new(EntityId(7), &EntityDefinition::monster(20.0, 56.0), Vec3::new(220.0, 128.0, 0.0), 0.0, None);
        let mut events = EventQueue::default();

        assert!(!entity_use(&mut world, &monster, &PhysicsConfig::default(), &mut events));
        assert!(events.take().is_empty());
    }
}
