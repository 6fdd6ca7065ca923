//! Sector Plane Mover
//!
//! The only path through which a floor or ceiling changes height. A move is
//! applied optimistically, every entity in the sector is re-resolved against
//! the new geometry lowest first, and if anything cannot fit the plane and
//! the whole group are put back by one shared displacement.
//!
//! ```text
//! 1. plane.z = target            (provisional)
//! 2. snapshot entities by bottom
//! 3. pass 1: save z, pin slow-lowering floor riders, clamp
//! 4. pass 2: squeeze test ──► crush event / block
//! 5. blocked ⇒ plane to the limit, every entity to save_z + delta
//! ```

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::config::PhysicsConfig;
use crate::world::entity::EntityId;
use crate::world::sector::{PlaneType, SectorId};
use crate::world::World;

use super::events::{EventQueue, PhysicsEvent};
use super::linker::{link_to_world, unlink_from_world};
use super::vertical::{clamp_between_floor_and_ceiling, set_entity_bounds_z};

// =============================================================================
// REQUEST / STATUS
// =============================================================================

/// Direction a plane travels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDirection {
    /// Increasing Z
    Up,
    /// Decreasing Z
    Down,
}

/// What happens when an entity is squeezed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrushMode {
    /// Keep moving through the entity, damaging it
    Doom,
    /// Damage the entity and stop
    Hexen,
}

/// Crushing behavior of a mover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrushData {
    /// Continue or stop on crush
    pub mode: CrushMode,
    /// Damage reported per crushing tick
    pub damage: u32,
}

/// One tick of plane movement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectorMoveRequest {
    /// Sector to move
    pub sector: SectorId,
    /// Floor or ceiling
    pub plane: PlaneType,
    /// Travel direction
    pub direction: MoveDirection,
    /// Maximum distance this tick
    pub speed: f64,
    /// Height to reach
    pub dest_z: f64,
    /// `None` means the mover cannot crush
    pub crush: Option<CrushData>,
}

/// Outcome of a plane move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorMoveStatus {
    /// Moved, nothing squeezed
    Success,
    /// Moved, at least one entity is being crushed
    Crush,
    /// Rejected and rolled back to the obstruction
    Blocked,
}

struct Saved {
    id: EntityId,
    z: f64,
    prev_z: f64,
}

// =============================================================================
// MOVE
// =============================================================================

/// Move a plane one tick toward `dest_z`, at most `speed` units.
pub fn move_sector_z(
    world: &mut World,
    request: &SectorMoveRequest,
    config: &PhysicsConfig,
    events: &mut EventQueue,
) -> SectorMoveStatus {
    let start_z = world.sector(request.sector).plane(request.plane).z;
    let target_z = step_toward(start_z, request.dest_z, request.speed);

    {
        let sector = world.sector_mut(request.sector);
        sector.active_mover = true;
        let plane = sector.plane_mut(request.plane);
        plane.prev_z = start_z;
        plane.z = target_z;
    }

    let snapshot = snapshot_by_bottom(world, request.sector);
    let saved = pin_and_clamp(world, request, &snapshot, config);

    let mut status = SectorMoveStatus::Success;
    let mut worst_overflow: Option<f64> = None;

    if can_squeeze(request) {
        for &id in &snapshot {
            let Some(overflow) = squeeze_overflow(world, id) else {
                continue;
            };

            match request.crush {
                Some(crush) => {
                    // Solid but unshootable things still squeeze; only shootable ones take damage.
                    if world.entity(id).is_some_and(|entity| entity.flags.shootable) {
                        events.push(PhysicsEvent::crushed(id, request.sector, crush.damage));
                    }
                    status = SectorMoveStatus::Crush;
                    if crush.mode == CrushMode::Hexen {
                        worst_overflow = Some(worst_overflow.map_or(overflow, |worst| worst.max(overflow)));
                    }
                }
                None => {
                    worst_overflow = Some(worst_overflow.map_or(overflow, |worst| worst.max(overflow)));
                }
            }
        }
    }

    let Some(overflow) = worst_overflow else {
        return status;
    };

    let limit_z = match request.direction {
        MoveDirection::Up => target_z - overflow,
        MoveDirection::Down => target_z + overflow,
    };
    let final_z = limit_z.clamp(start_z.min(target_z), start_z.max(target_z));
    world.sector_mut(request.sector).plane_mut(request.plane).z = final_z;

    // Floors carry what stands on them; ceilings leave everything in place.
    let delta = match request.plane {
        PlaneType::Floor => final_z - start_z,
        PlaneType::Ceiling => 0.0,
    };

    for saved in &saved {
        world.with_entity(saved.id, |world, entity| {
            unlink_from_world(world, entity);
            entity.position.z = saved.z + delta;
            entity.prev_position.z = saved.prev_z;
            link_to_world(world, entity, false);
        });
    }

    debug!(
        sector = request.sector.0,
        plane = ?request.plane,
        start_z,
        target_z,
        final_z,
        entities = saved.len(),
        "Sector move blocked"
    );

    SectorMoveStatus::Blocked
}

/// `from` moved toward `to` by no more than `speed`.
fn step_toward(from: f64, to: f64, speed: f64) -> f64 {
    let speed = speed.abs();
    if (to - from).abs() <= speed {
        to
    } else if to > from {
        from + speed
    } else {
        from - speed
    }
}

/// Rising ceilings and lowering floors never squeeze anything.
fn can_squeeze(request: &SectorMoveRequest) -> bool {
    !matches!(
        (request.plane, request.direction),
        (PlaneType::Ceiling, MoveDirection::Up) | (PlaneType::Floor, MoveDirection::Down)
    )
}

/// Entities in the sector, lowest bottom first (ties by id).
fn snapshot_by_bottom(world: &World, sector: SectorId) -> Vec<EntityId> {
    let mut snapshot: Vec<(f64, EntityId)> = world
        .sector(sector)
        .entities
        .iter()
        .filter_map(|&id| world.entity(id).map(|entity| (entity.bottom(), id)))
        .collect();
    snapshot.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    snapshot.into_iter().map(|(_, id)| id).collect()
}

/// Pass 1: save heights, pin riders of a slow lowering floor, re-clamp.
fn pin_and_clamp(
    world: &mut World,
    request: &SectorMoveRequest,
    snapshot: &[EntityId],
    config: &PhysicsConfig,
) -> Vec<Saved> {
    let sticky = request.plane == PlaneType::Floor
        && request.direction == MoveDirection::Down
        && request.speed.abs() <= config.stick_to_floor_speed;

    let mut saved = Vec::with_capacity(snapshot.len());
    for &id in snapshot {
        world.with_entity(id, |world, entity| {
            saved.push(Saved {
                id,
                z: entity.position.z,
                prev_z: entity.prev_position.z,
            });

            let pinned = sticky
                && entity.on_ground
                && !entity.flags.no_gravity
                && !entity.flags.float
                && entity.highest_floor_sector == request.sector;
            if pinned {
                let z = entity
                    .on_entity
                    .and_then(|support| world.entity(support))
                    .map_or(world.sector(request.sector).floor.z, |support| support.top());
                entity.position.z = z;
                entity.prev_position.z = z;
            }

            clamp_between_floor_and_ceiling(world, entity, false);
        });
    }
    saved
}

/// Pass 2 test: how far the entity sticks through its ceiling, if at all.
fn squeeze_overflow(world: &mut World, id: EntityId) -> Option<f64> {
    world
        .with_entity(id, |world, entity| {
            if !entity.flags.solid {
                return None;
            }
            set_entity_bounds_z(world, entity);
            let thing_z = if entity.on_ground {
                entity.highest_floor_z
            } else {
                entity.position.z
            };
            let overflow = thing_z + entity.height() - entity.lowest_ceiling_z;
            (overflow > 0.0).then_some(overflow)
        })
        .flatten()
}

// =============================================================================
// TESTS
// =============================================================================
