//! Physics Core
//!
//! Collision and movement for entities in a sector world. Everything runs on
//! the caller's thread against a `&mut World`; results come back as return
//! values and as events in the manager's queue.

pub mod events;
pub mod opening;
pub mod linker;
pub mod vertical;
pub mod horizontal;
pub mod sector_mover;
pub mod use_trace;

use tracing::warn;

use crate::config::PhysicsConfig;
use crate::core::vec::Vec3;
use crate::world::entity::{Entity, EntityDefinition, EntityId};
use crate::world::sector::SectorId;
use crate::world::World;

pub use events::{ActivationContext, ActivationEvent, EventQueue, PhysicsEvent};
pub use opening::LineOpening;
pub use horizontal::TryMoveData;
pub use sector_mover::{CrushData, CrushMode, MoveDirection, SectorMoveRequest, SectorMoveStatus};

/// Entry point for every physics operation.
#[derive(Clone, Debug, Default)]
pub struct PhysicsManager {
    config: PhysicsConfig,
    events: EventQueue,
}

impl PhysicsManager {
    /// Create a manager with the given tuning.
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            events: EventQueue::default(),
        }
    }

    /// Active tuning.
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Create an entity, link it, and hand back its id.
    pub fn spawn(
        &mut self,
        world: &mut World,
        definition: &EntityDefinition,
        position: Vec3,
        angle: f64,
        player: Option<u8>,
    ) -> EntityId {
        let id = world.allocate_entity_id();
        let mut entity = Entity::new(id, definition, position, angle, player);
        linker::link_to_world(world, &mut entity, false);
        entity.prev_position = entity.position;
        world.entities.insert(id, entity);
        id
    }

    /// Unlink and remove an entity.
    pub fn remove(&mut self, world: &mut World, id: EntityId) -> Option<Entity> {
        let mut entity = world.entities.remove(&id)?;
        linker::unlink_from_world(world, &mut entity);
        Some(entity)
    }

    /// Move one entity for one tick. Returns false for an unknown id.
    pub fn move_entity(&mut self, world: &mut World, id: EntityId) -> bool {
        let config = &self.config;
        let events = &mut self.events;
        let moved = world
            .with_entity(id, |world, entity| horizontal::move_entity(world, entity, config, events))
            .is_some();
        if !moved {
            warn!(entity = id.0, "Move requested for unknown entity");
        }
        moved
    }

    /// Move every entity in ascending id order, then advance the tick.
    pub fn tick(&mut self, world: &mut World) {
        let ids: Vec<EntityId> = world.entities.keys().copied().collect();
        for id in ids {
            self.move_entity(world, id);
        }
        world.tick += 1;
    }

    /// Fire the entity's use tracer. Returns true if a special was activated.
    pub fn entity_use(&mut self, world: &mut World, id: EntityId) -> bool {
        let config = &self.config;
        let events = &mut self.events;
        world
            .with_entity(id, |world, entity| use_trace::entity_use(world, entity, config, events))
            .unwrap_or_else(|| {
                warn!(entity = id.0, "Use requested for unknown entity");
                false
            })
    }

    /// Move a sector plane one tick.
    pub fn move_sector_z(&mut self, world: &mut World, request: &SectorMoveRequest) -> SectorMoveStatus {
        sector_mover::move_sector_z(world, request, &self.config, &mut self.events)
    }

    /// Mark a sector's mover as finished.
    pub fn stop_sector_move(&mut self, world: &mut World, sector: SectorId) {
        world.sector_mut(sector).active_mover = false;
    }

    /// Events raised since the last call (drains the queue).
    pub fn take_events(&mut self) -> Vec<PhysicsEvent> {
        self.events.take()
    }
}

// =============================================================================
// TESTS
// =============================================================================
