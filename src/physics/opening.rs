//! Line Openings
//!
//! The vertical gap across a two-sided line, and the passability predicates
//! built on it. Both the horizontal blocking check and the plane mover go
//! through [`line_blocks`], so they always agree on what is passable.

use crate::world::entity::Entity;
use crate::world::line::Line;
use crate::world::sector::Sector;
use crate::world::World;

/// Gap between two adjacent sectors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineOpening {
    /// Lower of the two ceilings
    pub ceiling_z: f64,
    /// Higher of the two floors
    pub floor_z: f64,
    /// `ceiling_z - floor_z`
    pub opening_height: f64,
}

impl LineOpening {
    /// Compute the opening between two sectors.
    pub fn new(front: &Sector, back: &Sector) -> Self {
        let ceiling_z = front.ceiling.z.min(back.ceiling.z);
        let floor_z = front.floor.z.max(back.floor.z);
        Self {
            ceiling_z,
            floor_z,
            opening_height: ceiling_z - floor_z,
        }
    }

    /// Opening of a line, or `None` for one-sided lines.
    pub fn of_line(world: &World, line: &Line) -> Option<Self> {
        let back = line.back?;
        Some(Self::new(world.sector(line.front), world.sector(back)))
    }

    /// Bottom is below the opening floor but within step height of it.
    pub fn can_step_up_into(&self, entity: &Entity) -> bool {
        let bottom = entity.bottom();
        bottom < self.floor_z && self.floor_z - bottom <= entity.max_step_height()
    }

    /// The entity fits through, stepping up if needed.
    pub fn can_pass_or_step_through(&self, entity: &Entity) -> bool {
        if entity.height() > self.opening_height {
            return false;
        }
        if entity.top() > self.ceiling_z {
            return false;
        }
        entity.bottom() >= self.floor_z || self.can_step_up_into(entity)
    }
}

/// True if the line stops this entity.
pub fn line_blocks(world: &World, line: &Line, entity: &Entity) -> bool {
    if line_blocks_by_flags(line, entity) {
        return true;
    }
    match LineOpening::of_line(world, line) {
        Some(opening) => !opening.can_pass_or_step_through(entity),
        None => true,
    }
}

/// One-sided lines and author blocking flags, ignoring heights.
pub fn line_blocks_by_flags(line: &Line, entity: &Entity) -> bool {
    if line.one_sided() || line.flags.block_everything {
        return true;
    }
    if entity.is_player() {
        line.flags.block_players
    } else {
        !entity.flags.missile && line.flags.block_monsters
    }
}

// =============================================================================
// TESTS
// =============================================================================
