//! Spatial Linker
//!
//! Installs an entity's membership in the blockmap, its sectors and
//! subsectors, and the overlap sets of other solid entities. Every position
//! or size change goes through unlink, update, link.
//!
//! The entity being linked is detached from `world.entities` by the caller
//! (see `World::with_entity`), so `&mut World` and `&mut Entity` never alias.

use std::collections::BTreeSet;

use crate::partition::blockmap::IterationStatus;
use crate::world::entity::{Entity, EntityId};
use crate::world::line::LineId;
use crate::world::World;
use super::vertical::clamp_between_floor_and_ceiling;

/// Link an unlinked entity at its current position, then clamp it between
/// floor and ceiling.
pub fn link_to_world(world: &mut World, entity: &mut Entity, smooth_z: bool) {
    debug_assert!(!entity.linked, "entity {:?} linked twice", entity.id);

    let footprint = entity.box2();

    if !entity.flags.no_blockmap {
        entity.blocks = world.blockmap.link_entity(entity.id, &footprint);
    }

    // The center leaf is always known for bounds lookups. Membership, with
    // the center leaf as fallback, is only installed for sector-linked entities.
    let center = world.bsp.find_subsector(entity.position.xy());
    entity.subsector = center;
    entity.sector = world.subsector(center).sector;

    if !entity.flags.no_sector && !entity.flags.no_clip {
        entity.intersect_subsectors.insert(center);
        entity.intersect_sectors.insert(entity.sector);

        for line_id in lines_in_box(world, &footprint) {
            let line = world.line(line_id);
            if !line.segment.intersects_box(&footprint) {
                continue;
            }

            entity.intersect_sectors.insert(line.front);
            if let Some(back) = line.back {
                entity.intersect_sectors.insert(back);
            }
            entity.intersect_subsectors.extend(line.subsectors.iter().copied());
            if line.has_special() {
                entity.intersect_special_lines.insert(line_id);
            }
        }
    }

    if entity.flags.solid {
        for other_id in entities_in_box(world, &footprint) {
            let Some(other) = world.entities.get_mut(&other_id) else {
                continue;
            };
            if !other.flags.solid || !other.box2().overlaps(&footprint) {
                continue;
            }
            other.intersect_entities.insert(entity.id);
            entity.intersect_entities.insert(other_id);
        }
    }

    for &sector in &entity.intersect_sectors {
        world.sector_mut(sector).entities.insert(entity.id);
    }
    for &subsector in &entity.intersect_subsectors {
        world.subsectors[subsector.0 as usize].entities.insert(entity.id);
    }

    entity.linked = true;
    clamp_between_floor_and_ceiling(world, entity, smooth_z);
}

/// Remove every membership installed by [`link_to_world`]. Idempotent.
pub fn unlink_from_world(world: &mut World, entity: &mut Entity) {
    if !entity.linked {
        return;
    }

    world.blockmap.unlink_entity(entity.id, &entity.blocks);
    entity.blocks.clear();

    for sector in std::mem::take(&mut entity.intersect_sectors) {
        world.sector_mut(sector).entities.remove(&entity.id);
    }
    for subsector in std::mem::take(&mut entity.intersect_subsectors) {
        world.subsectors[subsector.0 as usize].entities.remove(&entity.id);
    }
    for other_id in std::mem::take(&mut entity.intersect_entities) {
        if let Some(other) = world.entities.get_mut(&other_id) {
            other.intersect_entities.remove(&entity.id);
        }
    }
    entity.intersect_special_lines.clear();

    entity.linked = false;
}

/// Line ids stored in the cells overlapping `b`, deduplicated and sorted.
pub(crate) fn lines_in_box(world: &World, b: &crate::core::geometry::Box2) -> BTreeSet<LineId> {
    let mut lines = BTreeSet::new();
    world.blockmap.iterate_box(b, |block| {
        lines.extend(block.lines.iter().copied());
        IterationStatus::Continue
    });
    lines
}

/// Entity ids stored in the cells overlapping `b`, deduplicated and sorted.
pub(crate) fn entities_in_box(world: &World, b: &crate::core::geometry::Box2) -> BTreeSet<EntityId> {
    let mut entities = BTreeSet::new();
    world.blockmap.iterate_box(b, |block| {
        entities.extend(block.entities.iter().copied());
        IterationStatus::Continue
    });
    entities
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::core::vec::{Vec2, Vec3};
    use crate::world::entity::EntityDefinition;
    use crate::world::sector::SectorId;
    use crate::world::{RoomLevelBuilder, World};

    fn world() -> World {
        let mut builder = RoomLevelBuilder::new("link");
        builder.add_room(Vec2::new(0.0, 0.0), Vec2::new(256.0, 256.0), 0.0, 128.0);
        builder.add_room(Vec2::new(256.0, 0.0), Vec2::new(512.0, 256.0), 8.0, 128.0);
        World::from_level(&builder.build().unwrap(), &PhysicsConfig::default()).unwrap()
    }

    fn spawn(world: &mut World, def: &EntityDefinition, at: Vec3) -> EntityId {
        let id = world.allocate_entity_id();
        let mut entity = Entity::new(id, def, at, 0.0, None);
        link_to_world(world, &mut entity, false);
        world.entities.insert(id, entity);
        id
    }

    #[test]
    fn test_link_straddling_portal() {
        let mut world = world();
        let id = spawn(&mut world, &EntityDefinition::player(), Vec3::new(250.0, 128.0, 0.0));
        let entity = world.entity(id).unwrap();

        assert_eq!(entity.sector, SectorId(0));
        assert!(entity.intersect_sectors.contains(&SectorId(1)));
        assert!(world.sector(SectorId(0)).entities.contains(&id));
        assert!(world.sector(SectorId(1)).entities.contains(&id));
        // Highest floor under the box is the step
        assert_eq!(entity.position.z, 8.0);
        assert!(entity.on_ground);
    }

    #[test]
    fn test_center_fallback_only() {
        let mut world = world();
        let id = spawn(&mut world, &EntityDefinition::player(), Vec3::new(128.0, 128.0, 0.0));
        let entity = world.entity(id).unwrap();

        assert_eq!(entity.intersect_sectors.len(), 1);
        assert!(!world.sector(SectorId(1)).entities.contains(&id));
    }

    #[test]
    fn test_solid_overlap_symmetric() {
        let mut world = world();
        let a = spawn(&mut world, &EntityDefinition::player(), Vec3::new(100.0, 100.0, 0.0));
        let b = spawn(&mut world, &EntityDefinition::player(), Vec3::new(120.0, 100.0, 56.0));
        let item = spawn(&mut world, &EntityDefinition::item(), Vec3::new(110.0, 100.0, 0.0));

        assert!(world.entity(a).unwrap().intersect_entities.contains(&b));
        assert!(world.entity(b).unwrap().intersect_entities.contains(&a));
        assert!(world.entity(a).unwrap().intersect_entities.get(&item).is_none());
    }

    #[test]
    fn test_unlink_idempotent() {
        let mut world = world();
        let a = spawn(&mut world, &EntityDefinition::player(), Vec3::new(100.0, 100.0, 0.0));
        let b = spawn(&mut world, &EntityDefinition::player(), Vec3::new(120.0, 100.0, 56.0));

        world.with_entity(a, |world, entity| {
            unlink_from_world(world, entity);
            unlink_from_world(world, entity);
            assert!(!entity.linked);
            assert!(entity.blocks.is_empty());
        });

        assert!(world.sector(SectorId(0)).entities.get(&a).is_none());
        assert!(world.entity(b).unwrap().intersect_entities.is_empty());
        assert!(world.blockmap.block_indices(&world.entity(a).unwrap().box2())
            .iter()
            .all(|&i| !world.blockmap.block(i).unwrap().entities.contains(&a)));
    }

    #[test]
    fn test_no_clip_skips_sector_membership() {
        let mut world = world();
        let mut def = EntityDefinition::monster(20.0, 56.0);
        def.flags.no_clip = true;
        let id = spawn(&mut world, &def, Vec3::new(250.0, 128.0, 0.0));
        let entity = world.entity(id).unwrap();

        assert_eq!(entity.sector, SectorId(0));
        assert!(entity.intersect_sectors.is_empty());
        assert!(entity.intersect_subsectors.is_empty());
        assert!(!world.sector(SectorId(0)).entities.contains(&id));
        assert!(!world.sector(SectorId(1)).entities.contains(&id));
        assert!(world.subsectors.iter().all(|subsector| !subsector.entities.contains(&id)));
        // Still bounded by its center sector
        assert_eq!(entity.highest_floor_z, 0.0);
    }

    #[test]
    fn test_no_blockmap_flag() {
        let mut world = world();
        let mut def = EntityDefinition::item();
        def.flags.no_blockmap = true;
        let id = spawn(&mut world, &def, Vec3::new(128.0, 128.0, 0.0));

        assert!(world.entity(id).unwrap().blocks.is_empty());
        assert!(world.sector(SectorId(0)).entities.contains(&id));
    }
}
