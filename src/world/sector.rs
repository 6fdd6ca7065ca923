//! Sectors and subsectors.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use super::entity::EntityId;
use super::line::LineId;

/// Arena index of a sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SectorId(pub u32);

/// Arena index of a subsector (BSP leaf).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SubsectorId(pub u32);

/// Which plane of a sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaneType {
    /// The floor
    Floor,
    /// The ceiling
    Ceiling,
}

/// A horizontal plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectorPlane {
    /// Current height
    pub z: f64,
    /// Height before the last move
    pub prev_z: f64,
}

impl SectorPlane {
    /// A plane at rest.
    #[inline]
    pub const fn new(z: f64) -> Self {
        Self { z, prev_z: z }
    }
}

/// A region with its own floor and ceiling.
#[derive(Clone, Debug)]
pub struct Sector {
    /// Unique id
    pub id: SectorId,
    /// Floor plane
    pub floor: SectorPlane,
    /// Ceiling plane
    pub ceiling: SectorPlane,
    /// Tag targeted by line specials
    pub tag: u32,
    /// Opaque sector special
    pub special: u16,
    /// Entities whose box touches the sector
    pub entities: BTreeSet<EntityId>,
    /// A plane mover is currently driving this sector
    pub active_mover: bool,
}

impl Sector {
    /// Create an empty sector.
    pub fn new(id: SectorId, floor_z: f64, ceiling_z: f64) -> Self {
        Self {
            id,
            floor: SectorPlane::new(floor_z),
            ceiling: SectorPlane::new(ceiling_z),
            tag: 0,
            special: 0,
            entities: BTreeSet::new(),
            active_mover: false,
        }
    }

    /// The requested plane.
    #[inline]
    pub fn plane(&self, plane: PlaneType) -> &SectorPlane {
        match plane {
            PlaneType::Floor => &self.floor,
            PlaneType::Ceiling => &self.ceiling,
        }
    }

    /// The requested plane, mutably.
    #[inline]
    pub fn plane_mut(&mut self, plane: PlaneType) -> &mut SectorPlane {
        match plane {
            PlaneType::Floor => &mut self.floor,
            PlaneType::Ceiling => &mut self.ceiling,
        }
    }
}

/// A convex BSP leaf belonging to one sector.
#[derive(Clone, Debug)]
pub struct Subsector {
    /// Unique id
    pub id: SubsectorId,
    /// Owning sector
    pub sector: SectorId,
    /// Lines bounding the leaf
    pub lines: Vec<LineId>,
    /// Entities whose box touches the leaf
    pub entities: BTreeSet<EntityId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_access() {
        let mut sector = Sector::new(SectorId(0), 0.0, 128.0);
        assert_eq!(sector.plane(PlaneType::Ceiling).z, 128.0);

        sector.plane_mut(PlaneType::Floor).z = 16.0;
        assert_eq!(sector.floor.z, 16.0);
        assert_eq!(sector.floor.prev_z, 0.0);
    }
}
