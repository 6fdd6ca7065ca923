//! World Model
//!
//! The level geometry (lines, sectors, subsectors), the spatial partition
//! built over it, and the entity arena. Entities live in a `BTreeMap` so
//! every pass visits them in ascending id order.

pub mod entity;
pub mod line;
pub mod sector;
pub mod level;
pub mod builder;

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::PhysicsConfig;
use crate::core::geometry::{Box2, Seg2};
use crate::core::hash::{compute_state_hash, StateHash};
use crate::partition::blockmap::Blockmap;
use crate::partition::bsp::BspTree;

pub use entity::{Blocker, BoundSource, Entity, EntityDefinition, EntityFlags, EntityId, EntityProperties};
pub use line::{Line, LineActivation, LineFlags, LineId, LineSpecial};
pub use sector::{PlaneType, Sector, SectorId, SectorPlane, Subsector, SubsectorId};
pub use level::{LevelData, LevelError, LineData, SectorData, SubsectorData};
pub use builder::{RoomLevelBuilder, WallSide};

/// A loaded level and everything in it.
#[derive(Clone, Debug)]
pub struct World {
    /// Level name
    pub name: String,
    /// Lines by id
    pub lines: Vec<Line>,
    /// Sectors by id
    pub sectors: Vec<Sector>,
    /// Subsectors by id
    pub subsectors: Vec<Subsector>,
    /// Point location tree
    pub bsp: BspTree,
    /// Broad phase grid
    pub blockmap: Blockmap,
    /// Entities (BTreeMap for deterministic iteration)
    pub entities: BTreeMap<EntityId, Entity>,
    /// Next entity id (monotonic counter)
    pub next_entity_id: u32,
    /// Ticks simulated
    pub tick: u64,
}

impl World {
    /// Build a world from validated level data.
    pub fn from_level(level: &LevelData, config: &PhysicsConfig) -> Result<Self, LevelError> {
        level.validate()?;

        let sectors: Vec<Sector> = level
            .sectors
            .iter()
            .enumerate()
            .map(|(index, data)| {
                let mut sector = Sector::new(SectorId(index as u32), data.floor_z, data.ceiling_z);
                sector.tag = data.tag;
                sector.special = data.special;
                sector
            })
            .collect();

        let mut lines: Vec<Line> = level
            .lines
            .iter()
            .enumerate()
            .map(|(index, data)| Line {
                id: LineId(index as u32),
                segment: Seg2::new(data.start, data.end),
                front: SectorId(data.front),
                back: data.back.map(SectorId),
                flags: data.flags,
                special: data.special,
                subsectors: Vec::new(),
                activated: false,
            })
            .collect();

        let subsectors: Vec<Subsector> = level
            .subsectors
            .iter()
            .enumerate()
            .map(|(index, data)| Subsector {
                id: SubsectorId(index as u32),
                sector: SectorId(data.sector),
                lines: data.lines.iter().copied().map(LineId).collect(),
                entities: Default::default(),
            })
            .collect();

        for subsector in &subsectors {
            for line_id in &subsector.lines {
                let line = &mut lines[line_id.0 as usize];
                if !line.subsectors.contains(&subsector.id) {
                    line.subsectors.push(subsector.id);
                }
            }
        }

        let bounds = level_bounds(&lines);
        let blockmap = Blockmap::new(bounds, config.block_size, &lines);
        let bsp = BspTree::new(level.nodes.clone(), level.root);

        debug!(
            level = %level.name,
            lines = lines.len(),
            sectors = sectors.len(),
            subsectors = subsectors.len(),
            blocks = blockmap.width() * blockmap.height(),
            "World built"
        );

        Ok(Self {
            name: level.name.clone(),
            lines,
            sectors,
            subsectors,
            bsp,
            blockmap,
            entities: BTreeMap::new(),
            next_entity_id: 0,
            tick: 0,
        })
    }

    /// Line by id.
    #[inline]
    pub fn line(&self, id: LineId) -> &Line {
        &self.lines[id.0 as usize]
    }

    /// Sector by id.
    #[inline]
    pub fn sector(&self, id: SectorId) -> &Sector {
        &self.sectors[id.0 as usize]
    }

    /// Sector by id, mutably.
    #[inline]
    pub fn sector_mut(&mut self, id: SectorId) -> &mut Sector {
        &mut self.sectors[id.0 as usize]
    }

    /// Subsector by id.
    #[inline]
    pub fn subsector(&self, id: SubsectorId) -> &Subsector {
        &self.subsectors[id.0 as usize]
    }

    /// Entity by id.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Entity by id, mutably.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Allocate the next entity id.
    pub fn allocate_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    /// Sectors carrying `tag`, in id order.
    pub fn sectors_with_tag(&self, tag: u32) -> impl Iterator<Item = &Sector> {
        self.sectors.iter().filter(move |sector| sector.tag == tag)
    }

    /// Run `f` with an entity taken out of the arena.
    ///
    /// The entity is absent from `world.entities` for the duration of the
    /// call, so it never sees itself when scanning neighbours. Returns `None`
    /// for an unknown id.
    pub fn with_entity<R, F>(&mut self, id: EntityId, f: F) -> Option<R>
    where
        F: FnOnce(&mut World, &mut Entity) -> R,
    {
        let mut entity = self.entities.remove(&id)?;
        let result = f(self, &mut entity);
        self.entities.insert(id, entity);
        Some(result)
    }

    /// Compute hash of current state for replay verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |hasher| {
            // Entities in sorted order (BTreeMap guarantees this)
            for entity in self.entities.values() {
                entity.hash_into(hasher);
            }

            for sector in &self.sectors {
                hasher.update_u32(sector.id.0);
                hasher.update_f64(sector.floor.z);
                hasher.update_f64(sector.ceiling.z);
            }

            for line in &self.lines {
                hasher.update_bool(line.activated);
            }
        })
    }
}

/// Box around every line vertex.
fn level_bounds(lines: &[Line]) -> Box2 {
    let mut iter = lines.iter().map(|line| line.segment.bbox());
    match iter.next() {
        Some(first) => iter.fold(first, |acc, b| acc.union(&b)),
        None => Box2::new(Default::default(), Default::default()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
