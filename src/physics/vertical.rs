//! Vertical Resolver
//!
//! Finds the floor and ceiling bounding an entity (sector planes and the
//! solid entities it overlaps), clamps it between them, and integrates
//! vertical velocity.
//!
//! Stacking decisions compare last tick's heights (`prev_position.z`) of
//! both entities, so an entity that was standing on another keeps treating
//! it as floor however far the supporter has already moved this tick.

use crate::config::PhysicsConfig;
use crate::world::entity::{BoundSource, Entity};
use crate::world::World;

/// Recompute `highest_floor_z` / `lowest_ceiling_z` and their sources.
pub fn set_entity_bounds_z(world: &World, entity: &mut Entity) {
    let center = world.sector(entity.sector);
    let mut highest_floor_z = center.floor.z;
    let mut lowest_ceiling_z = center.ceiling.z;
    let mut highest_floor_sector = center.id;
    let mut lowest_ceiling_sector = center.id;

    for &sector_id in &entity.intersect_sectors {
        let sector = world.sector(sector_id);
        if sector.floor.z > highest_floor_z {
            highest_floor_z = sector.floor.z;
            highest_floor_sector = sector_id;
        }
        if sector.ceiling.z < lowest_ceiling_z {
            lowest_ceiling_z = sector.ceiling.z;
            lowest_ceiling_sector = sector_id;
        }
    }

    let mut highest_floor = BoundSource::Sector(highest_floor_sector);
    let mut lowest_ceiling = BoundSource::Sector(lowest_ceiling_sector);

    let prev_box = entity.prev_box3();
    let prev_bottom = entity.prev_position.z;
    let prev_top = prev_bottom + entity.height();
    let step = entity.max_step_height();

    for &other_id in &entity.intersect_entities {
        let Some(other) = world.entity(other_id) else {
            continue;
        };
        if !other.flags.solid {
            continue;
        }

        // Already interpenetrating last tick: neither floor nor ceiling.
        let other_prev = other.prev_box3();
        if prev_box.overlaps(&other_prev) {
            continue;
        }

        // Both sides of the comparison use last tick's heights; the bound
        // itself is the other entity's current plane.
        let above = prev_bottom >= other_prev.max.z;
        let below = prev_top <= other_prev.min.z;

        if above {
            if other.top() > highest_floor_z {
                highest_floor_z = other.top();
                highest_floor = BoundSource::Entity(other_id);
            }
        } else if below {
            if other.bottom() < lowest_ceiling_z {
                lowest_ceiling_z = other.bottom();
                lowest_ceiling = BoundSource::Entity(other_id);
            }
        } else if entity.bottom() + step >= other.top() && other.top() > highest_floor_z {
            highest_floor_z = other.top();
            highest_floor = BoundSource::Entity(other_id);
        }
    }

    entity.highest_floor_z = highest_floor_z;
    entity.lowest_ceiling_z = lowest_ceiling_z;
    entity.highest_floor = highest_floor;
    entity.lowest_ceiling = lowest_ceiling;
    entity.highest_floor_sector = highest_floor_sector;
    entity.lowest_ceiling_sector = lowest_ceiling_sector;
}

/// Push the entity below its ceiling, then onto its floor.
///
/// With `smooth_z`, `z_smoothing` is raised when the floor support differs
/// from the one the entity started the move on.
pub fn clamp_between_floor_and_ceiling(world: &World, entity: &mut Entity, smooth_z: bool) {
    set_entity_bounds_z(world, entity);

    entity.on_entity = None;

    if entity.top() > entity.lowest_ceiling_z {
        entity.position.z = entity.lowest_ceiling_z - entity.height();
        entity.velocity.z = 0.0;
    }

    // Floor wins when both are violated.
    if entity.bottom() <= entity.highest_floor_z {
        entity.position.z = entity.highest_floor_z;
        if entity.velocity.z < 0.0 {
            entity.velocity.z = 0.0;
        }
        if let BoundSource::Entity(support) = entity.highest_floor {
            entity.on_entity = Some(support);
        }
        if smooth_z && entity.highest_floor != entity.move_start_floor {
            entity.z_smoothing = true;
        }
    }

    entity.on_ground = entity.highest_floor_z >= entity.position.z;
}

/// Apply gravity, integrate vertical velocity, clamp.
pub fn move_z(world: &World, entity: &mut Entity, config: &PhysicsConfig) {
    if !entity.on_ground && !entity.flags.no_gravity {
        entity.velocity.z -= config.gravity;
    }

    entity.position.z += entity.velocity.z;
    clamp_between_floor_and_ceiling(world, entity, true);
}

// =============================================================================
// TESTS
// =============================================================================
