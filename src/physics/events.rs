//! Physics Events
//!
//! Notifications raised during movement and drained by the caller once per
//! tick. The physics core only detects geometric conditions; executing a
//! line special or applying crush damage is left to game logic.

use serde::{Serialize, Deserialize};

use crate::world::entity::EntityId;
use crate::world::line::LineId;
use crate::world::sector::SectorId;

/// How a line special was reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationContext {
    /// The entity's center walked across the line
    CrossLine,
    /// The entity's use trace selected the line
    UseLine,
}

/// A line special should fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationEvent {
    /// Cross or use
    pub context: ActivationContext,
    /// Activating entity
    pub entity: EntityId,
    /// Activated line
    pub line: LineId,
    /// Entity started on the line's front side
    pub from_front: bool,
}

/// Physics event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhysicsEvent {
    /// A line special should fire
    Activation(ActivationEvent),

    /// A player's use trace hit a wall with nothing to use
    UseFailed {
        /// Entity that tried to use
        entity: EntityId,
    },

    /// A moving plane is squeezing an entity
    Crushed {
        /// Squeezed entity
        entity: EntityId,
        /// Sector whose plane is moving
        sector: SectorId,
        /// Damage requested by the mover
        damage: u32,
    },
}

impl PhysicsEvent {
    /// Create a line-cross activation.
    pub fn cross(entity: EntityId, line: LineId, from_front: bool) -> Self {
        PhysicsEvent::Activation(ActivationEvent {
            context: ActivationContext::CrossLine,
            entity,
            line,
            from_front,
        })
    }

    /// Create a use activation.
    pub fn use_line(entity: EntityId, line: LineId, from_front: bool) -> Self {
        PhysicsEvent::Activation(ActivationEvent {
            context: ActivationContext::UseLine,
            entity,
            line,
            from_front,
        })
    }

    /// Create a failed-use event.
    pub fn use_failed(entity: EntityId) -> Self {
        PhysicsEvent::UseFailed { entity }
    }

    /// Create a crush event.
    pub fn crushed(entity: EntityId, sector: SectorId, damage: u32) -> Self {
        PhysicsEvent::Crushed { entity, sector, damage }
    }

    /// Entity the event concerns.
    pub fn entity(&self) -> EntityId {
        match self {
            PhysicsEvent::Activation(activation) => activation.entity,
            PhysicsEvent::UseFailed { entity } => *entity,
            PhysicsEvent::Crushed { entity, .. } => *entity,
        }
    }
}

/// Output queue for events raised inside a physics call.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<PhysicsEvent>,
}

impl EventQueue {
    /// Push an event.
    #[inline]
    pub fn push(&mut self, event: PhysicsEvent) {
        self.events.push(event);
    }

    /// Take pending events (consumes them).
    pub fn take(&mut self) -> Vec<PhysicsEvent> {
        std::mem::take(&mut self.events)
    }
}

// =============================================================================
// TESTS
// =============================================================================
