//! Entity (actor) state.
//!
//! An entity's position is the center of its footprint at the bottom of its
//! box. Membership in sectors, subsectors and blockmap cells is stored as id
//! sets and kept in sync by the linker.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::config::MIN_ENTITY_RADIUS;
use crate::core::geometry::{Box2, Box3};
use crate::core::hash::StateHasher;
use crate::core::vec::{Vec2, Vec3};
use super::line::LineId;
use super::sector::{SectorId, SubsectorId};

// =============================================================================
// ENTITY ID
// =============================================================================

/// Arena index of an entity. Ordering defines processing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct EntityId(pub u32);

// =============================================================================
// DEFINITION
// =============================================================================

/// Static size properties.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityProperties {
    /// Half-width of the square footprint
    pub radius: f64,
    /// Box height
    pub height: f64,
    /// Tallest ledge the entity can walk up
    pub max_step_height: f64,
}

impl Default for EntityProperties {
    fn default() -> Self {
        Self {
            radius: 20.0,
            height: 16.0,
            max_step_height: 24.0,
        }
    }
}

/// Behavior flags read by the physics passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityFlags {
    /// Blocks and is blocked by other solid entities
    pub solid: bool,
    /// Can take damage; crush events are only raised for shootable entities
    pub shootable: bool,
    /// Ignores all collision
    pub no_clip: bool,
    /// Not pulled down by gravity
    pub no_gravity: bool,
    /// Slides along walls instead of stopping dead
    pub slides_on_walls: bool,
    /// Projectile
    pub missile: bool,
    /// Projectile that may still step up ledges
    pub step_missile: bool,
    /// Not inserted into the blockmap
    pub no_blockmap: bool,
    /// Not linked into sectors beyond its center sector
    pub no_sector: bool,
    /// Flying monster
    pub float: bool,
}

/// Upstream actor definition an entity is spawned from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Display name
    pub name: String,
    /// Size properties
    #[serde(default)]
    pub properties: EntityProperties,
    /// Physics flags
    #[serde(default)]
    pub flags: EntityFlags,
}

impl EntityDefinition {
    /// A player-sized solid walker that slides on walls.
    pub fn player() -> Self {
        Self {
            name: "Player".to_string(),
            properties: EntityProperties {
                radius: 16.0,
                height: 56.0,
                max_step_height: 24.0,
            },
            flags: EntityFlags {
                solid: true,
                shootable: true,
                slides_on_walls: true,
                ..EntityFlags::default()
            },
        }
    }

    /// A solid monster that stops at walls.
    pub fn monster(radius: f64, height: f64) -> Self {
        Self {
            name: "Monster".to_string(),
            properties: EntityProperties {
                radius,
                height,
                max_step_height: 24.0,
            },
            flags: EntityFlags {
                solid: true,
                shootable: true,
                ..EntityFlags::default()
            },
        }
    }

    /// A non-solid pickup.
    pub fn item() -> Self {
        Self {
            name: "Item".to_string(),
            properties: EntityProperties {
                radius: 20.0,
                height: 16.0,
                max_step_height: 24.0,
            },
            flags: EntityFlags::default(),
        }
    }

    /// A gravity-free projectile.
    pub fn missile(radius: f64, height: f64) -> Self {
        Self {
            name: "Missile".to_string(),
            properties: EntityProperties {
                radius,
                height,
                max_step_height: 0.0,
            },
            flags: EntityFlags {
                missile: true,
                no_gravity: true,
                ..EntityFlags::default()
            },
        }
    }
}

// =============================================================================
// BOUNDS
// =============================================================================

/// What provides an entity's current floor or ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BoundSource {
    /// A sector plane
    Sector(SectorId),
    /// The top or bottom of another entity
    Entity(EntityId),
}

/// What stopped an entity's last horizontal move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Blocker {
    /// A wall or impassable opening
    Line(LineId),
    /// A solid entity
    Entity(EntityId),
}

// =============================================================================
// ENTITY
// =============================================================================

/// A simulated actor.
#[derive(Clone, Debug)]
pub struct Entity {
    /// Unique id
    pub id: EntityId,
    /// Definition name (for logs)
    pub name: String,
    /// Bottom-center position
    pub position: Vec3,
    /// Position at the start of the current move
    pub prev_position: Vec3,
    /// Velocity in map units per tick
    pub velocity: Vec3,
    /// Facing angle in radians
    pub angle: f64,
    /// Size properties
    pub properties: EntityProperties,
    /// Physics flags
    pub flags: EntityFlags,
    /// Player number, if controlled by a player
    pub player: Option<u8>,

    // =========================================================================
    // Linkage (owned by the linker)
    // =========================================================================

    /// Sector containing the center
    pub sector: SectorId,
    /// Subsector containing the center
    pub subsector: SubsectorId,
    /// Every sector the box touches
    pub intersect_sectors: BTreeSet<SectorId>,
    /// Every subsector the box touches
    pub intersect_subsectors: BTreeSet<SubsectorId>,
    /// Solid entities whose boxes overlap in 2D
    pub intersect_entities: BTreeSet<EntityId>,
    /// Lines with a special that cross the box
    pub intersect_special_lines: BTreeSet<LineId>,
    /// Blockmap cells the entity is stored in
    pub blocks: Vec<usize>,
    /// Whether the entity is currently linked
    pub linked: bool,

    // =========================================================================
    // Vertical bounds (owned by the vertical resolver)
    // =========================================================================

    /// Highest floor under the box
    pub highest_floor_z: f64,
    /// Lowest ceiling over the box
    pub lowest_ceiling_z: f64,
    /// Where the highest floor comes from
    pub highest_floor: BoundSource,
    /// Where the lowest ceiling comes from
    pub lowest_ceiling: BoundSource,
    /// Sector with the highest floor plane
    pub highest_floor_sector: SectorId,
    /// Sector with the lowest ceiling plane
    pub lowest_ceiling_sector: SectorId,
    /// Floor source at the start of the current move
    pub move_start_floor: BoundSource,
    /// Standing on a floor or entity
    pub on_ground: bool,
    /// Entity being stood on
    pub on_entity: Option<EntityId>,
    /// Floor support changed this tick (camera smoothing hint)
    pub z_smoothing: bool,
    /// What stopped the last horizontal move
    pub blocking: Option<Blocker>,
}

impl Entity {
    /// Create an unlinked entity.
    pub fn new(
        id: EntityId,
        definition: &EntityDefinition,
        position: Vec3,
        angle: f64,
        player: Option<u8>,
    ) -> Self {
        debug_assert!(
            definition.properties.radius > MIN_ENTITY_RADIUS,
            "{}: radius {} must exceed {}",
            definition.name,
            definition.properties.radius,
            MIN_ENTITY_RADIUS
        );
        let unset = BoundSource::Sector(SectorId(0));
        Self {
            id,
            name: definition.name.clone(),
            position,
            prev_position: position,
            velocity: Vec3::ZERO,
            angle,
            properties: definition.properties,
            flags: definition.flags,
            player,
            sector: SectorId(0),
            subsector: SubsectorId(0),
            intersect_sectors: BTreeSet::new(),
            intersect_subsectors: BTreeSet::new(),
            intersect_entities: BTreeSet::new(),
            intersect_special_lines: BTreeSet::new(),
            blocks: Vec::new(),
            linked: false,
            highest_floor_z: f64::NEG_INFINITY,
            lowest_ceiling_z: f64::INFINITY,
            highest_floor: unset,
            lowest_ceiling: unset,
            highest_floor_sector: SectorId(0),
            lowest_ceiling_sector: SectorId(0),
            move_start_floor: unset,
            on_ground: false,
            on_entity: None,
            z_smoothing: false,
            blocking: None,
        }
    }

    /// Footprint half-width.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.properties.radius
    }

    /// Box height.
    #[inline]
    pub fn height(&self) -> f64 {
        self.properties.height
    }

    /// Box bottom.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.position.z
    }

    /// Box top.
    #[inline]
    pub fn top(&self) -> f64 {
        self.position.z + self.properties.height
    }

    /// Effective step height. Missiles never step unless flagged.
    #[inline]
    pub fn max_step_height(&self) -> f64 {
        if self.flags.missile && !self.flags.step_missile {
            0.0
        } else {
            self.properties.max_step_height
        }
    }

    /// Controlled by a player.
    #[inline]
    pub fn is_player(&self) -> bool {
        self.player.is_some()
    }

    /// 2D footprint at the current position.
    #[inline]
    pub fn box2(&self) -> Box2 {
        Box2::from_center(self.position.xy(), self.properties.radius)
    }

    /// 2D footprint if the center were at `center`.
    #[inline]
    pub fn box2_at(&self, center: Vec2) -> Box2 {
        Box2::from_center(center, self.properties.radius)
    }

    /// 3D box at the current position.
    #[inline]
    pub fn box3(&self) -> Box3 {
        Box3::from_bottom_center(self.position, self.properties.radius, self.properties.height)
    }

    /// 3D box at the previous position.
    #[inline]
    pub fn prev_box3(&self) -> Box3 {
        Box3::from_bottom_center(self.prev_position, self.properties.radius, self.properties.height)
    }

    /// Hash this entity's simulated state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_vec3(self.position);
        hasher.update_vec3(self.velocity);
        hasher.update_f64(self.angle);
        hasher.update_u32(self.sector.0);
        hasher.update_f64(self.highest_floor_z);
        hasher.update_f64(self.lowest_ceiling_z);
        hasher.update_bool(self.on_ground);
        hasher.update_opt_u32(self.on_entity.map(|id| id.0));
        hasher.update_bool(self.linked);
    }
}

// =============================================================================
// TESTS
// =============================================================================
