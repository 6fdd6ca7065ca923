//! Lines: the walls and portals between sectors.

use serde::{Serialize, Deserialize};

use crate::core::geometry::Seg2;
use super::sector::{SectorId, SubsectorId};

/// Arena index of a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct LineId(pub u32);

/// Blocking flags set by the map author.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineFlags {
    /// Blocks players only
    pub block_players: bool,
    /// Blocks monsters (not players or projectiles)
    pub block_monsters: bool,
    /// Blocks every entity
    pub block_everything: bool,
}

/// How a line special is triggered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineActivation {
    /// A player walks across
    PlayerCross,
    /// A monster walks across
    MonsterCross,
    /// A player or monster walks across
    AnyCross,
    /// A projectile flies across
    ProjectileCross,
    /// A player presses use on it
    PlayerUse,
    /// Anything presses use on it
    AnyUse,
}

impl LineActivation {
    /// Triggered by walking across.
    pub fn is_cross(self) -> bool {
        matches!(
            self,
            LineActivation::PlayerCross
                | LineActivation::MonsterCross
                | LineActivation::AnyCross
                | LineActivation::ProjectileCross
        )
    }

    /// Crossing by an entity of this kind triggers the special.
    pub fn crossed_by(self, player: bool, missile: bool) -> bool {
        match self {
            LineActivation::PlayerCross => player,
            LineActivation::MonsterCross => !player && !missile,
            LineActivation::AnyCross => !missile,
            LineActivation::ProjectileCross => missile,
            LineActivation::PlayerUse | LineActivation::AnyUse => false,
        }
    }

    /// Using the line as this kind of entity triggers the special.
    pub fn used_by(self, player: bool) -> bool {
        match self {
            LineActivation::AnyUse => true,
            LineActivation::PlayerUse => player,
            _ => false,
        }
    }
}

/// A behavior attached to a line. The physics core only reports when it
/// should fire; `kind` and `sector_tag` are opaque to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpecial {
    /// Behavior tag (door, lift, teleporter, exit...)
    pub kind: u16,
    /// Trigger
    pub activation: LineActivation,
    /// Can fire more than once
    #[serde(default)]
    pub repeat: bool,
    /// Sector tag the behavior targets
    #[serde(default)]
    pub sector_tag: u32,
}

/// A boundary segment. The front sector is on the right of `segment`.
#[derive(Clone, Debug)]
pub struct Line {
    /// Unique id
    pub id: LineId,
    /// Start to end
    pub segment: Seg2,
    /// Sector on the right
    pub front: SectorId,
    /// Sector on the left, if two-sided
    pub back: Option<SectorId>,
    /// Blocking flags
    pub flags: LineFlags,
    /// Attached special
    pub special: Option<LineSpecial>,
    /// Subsectors bordered by this line
    pub subsectors: Vec<SubsectorId>,
    /// A non-repeatable special has fired
    pub activated: bool,
}

impl Line {
    /// Solid wall with nothing behind it.
    #[inline]
    pub fn one_sided(&self) -> bool {
        self.back.is_none()
    }

    /// Carries a special.
    #[inline]
    pub fn has_special(&self) -> bool {
        self.special.is_some()
    }

    /// The special may still fire (repeatable, or not yet used).
    #[inline]
    pub fn special_available(&self) -> bool {
        match self.special {
            Some(special) => special.repeat || !self.activated,
            None => false,
        }
    }

    /// Record a firing; only non-repeatable specials latch.
    pub fn mark_activated(&mut self) {
        if let Some(special) = self.special {
            if !special.repeat {
                self.activated = true;
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
