//! Level Data
//!
//! Serializable level description produced upstream (importer, or the room
//! builder) and its validation. `World::from_level` only accepts data that
//! passes [`LevelData::validate`], so the physics passes can index arenas
//! without checking.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::vec::Vec2;
use crate::partition::bsp::{BspChild, BspNode};
use super::line::{LineFlags, LineSpecial};

/// Sector heights and tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectorData {
    /// Floor height
    pub floor_z: f64,
    /// Ceiling height
    pub ceiling_z: f64,
    /// Tag targeted by line specials
    #[serde(default)]
    pub tag: u32,
    /// Opaque sector special
    #[serde(default)]
    pub special: u16,
}

/// A line by sector index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    /// Start vertex
    pub start: Vec2,
    /// End vertex
    pub end: Vec2,
    /// Sector on the right
    pub front: u32,
    /// Sector on the left
    #[serde(default)]
    pub back: Option<u32>,
    /// Blocking flags
    #[serde(default)]
    pub flags: LineFlags,
    /// Attached special
    #[serde(default)]
    pub special: Option<LineSpecial>,
}

/// A BSP leaf by index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubsectorData {
    /// Owning sector
    pub sector: u32,
    /// Bounding lines
    pub lines: Vec<u32>,
}

/// A complete level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    /// Level name
    #[serde(default)]
    pub name: String,
    /// Sectors by index
    pub sectors: Vec<SectorData>,
    /// Lines by index
    pub lines: Vec<LineData>,
    /// Subsectors by index
    pub subsectors: Vec<SubsectorData>,
    /// BSP nodes; children always have a lower index than their parent
    #[serde(default)]
    pub nodes: Vec<BspNode>,
    /// Tree root
    pub root: BspChild,
}

/// Level construction errors.
#[derive(Debug, Error)]
pub enum LevelError {
    /// Level has no sectors or no subsectors.
    #[error("level has no {0}")]
    Empty(&'static str),

    /// Sector floor above its ceiling.
    #[error("sector {sector} floor {floor_z} is above ceiling {ceiling_z}")]
    InvertedSector {
        /// Sector index
        sector: u32,
        /// Floor height
        floor_z: f64,
        /// Ceiling height
        ceiling_z: f64,
    },

    /// Line references a missing sector.
    #[error("line {line} references unknown sector {sector}")]
    UnknownSector {
        /// Line index
        line: u32,
        /// Bad sector index
        sector: u32,
    },

    /// Line has zero length.
    #[error("line {0} has zero length")]
    DegenerateLine(u32),

    /// Subsector references a missing sector or line.
    #[error("subsector {subsector} references unknown {kind} {index}")]
    BadSubsector {
        /// Subsector index
        subsector: u32,
        /// "sector" or "line"
        kind: &'static str,
        /// Bad index
        index: u32,
    },

    /// BSP link out of range or not strictly descending.
    #[error("bsp node {node} has invalid child {child:?}")]
    BadBspChild {
        /// Parent node index (or the node count for the root)
        node: u32,
        /// Offending child
        child: BspChild,
    },

    /// Room has no area.
    #[error("room {0} has no area")]
    EmptyRoom(usize),

    /// Two rooms overlap.
    #[error("rooms {0} and {1} overlap")]
    RoomOverlap(usize, usize),

    /// Room index out of range.
    #[error("unknown room {0}")]
    UnknownRoom(usize),

    /// Rooms cannot be split by axis-aligned cuts.
    #[error("rooms cannot be partitioned by axis-aligned cuts")]
    NotPartitionable,

    /// JSON decoding error.
    #[error("level json: {0}")]
    Json(#[from] serde_json::Error),
}

impl LevelData {
    /// Parse a level from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: LevelData = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Check every cross reference.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.sectors.is_empty() {
            return Err(LevelError::Empty("sectors"));
        }
        if self.subsectors.is_empty() {
            return Err(LevelError::Empty("subsectors"));
        }

        for (index, sector) in self.sectors.iter().enumerate() {
            if sector.floor_z > sector.ceiling_z {
                return Err(LevelError::InvertedSector {
                    sector: index as u32,
                    floor_z: sector.floor_z,
                    ceiling_z: sector.ceiling_z,
                });
            }
        }

        let sector_count = self.sectors.len() as u32;
        for (index, line) in self.lines.iter().enumerate() {
            let line_index = index as u32;
            if line.start == line.end {
                return Err(LevelError::DegenerateLine(line_index));
            }
            for sector in std::iter::once(line.front).chain(line.back) {
                if sector >= sector_count {
                    return Err(LevelError::UnknownSector { line: line_index, sector });
                }
            }
        }

        for (index, subsector) in self.subsectors.iter().enumerate() {
            let subsector_index = index as u32;
            if subsector.sector >= sector_count {
                return Err(LevelError::BadSubsector {
                    subsector: subsector_index,
                    kind: "sector",
                    index: subsector.sector,
                });
            }
            if let Some(&line) = subsector.lines.iter().find(|&&l| l as usize >= self.lines.len()) {
                return Err(LevelError::BadSubsector {
                    subsector: subsector_index,
                    kind: "line",
                    index: line,
                });
            }
        }

        let node_count = self.nodes.len() as u32;
        self.validate_child(node_count, self.root)?;
        for (index, node) in self.nodes.iter().enumerate() {
            let index = index as u32;
            self.validate_child(index, node.front)?;
            self.validate_child(index, node.back)?;
        }

        Ok(())
    }

    /// Children must point strictly downward, which also rules out cycles.
    fn validate_child(&self, parent: u32, child: BspChild) -> Result<(), LevelError> {
        let valid = match child {
            BspChild::Node(index) => index < parent,
            BspChild::Subsector(id) => (id.0 as usize) < self.subsectors.len(),
        };
        if valid {
            Ok(())
        } else {
            Err(LevelError::BadBspChild { node: parent, child })
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
