//! # Sector Physics
//!
//! Deterministic collision and movement core for sector-based levels: entities
//! with square footprints move through a world of two-sided lines, sectors
//! with independent floor and ceiling heights, and planes that rise and fall.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SECTOR PHYSICS                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── vec.rs      - 2D/3D vectors                             │
//! │  ├── geometry.rs - Segments, boxes, intersection tests       │
//! │  └── hash.rs     - State hashing for replay verification     │
//! │                                                              │
//! │  world/          - Level and entity model                    │
//! │  ├── level.rs    - Serializable level data + validation      │
//! │  ├── builder.rs  - Room-based level construction             │
//! │  ├── line.rs     - Lines, flags, specials                    │
//! │  ├── sector.rs   - Sectors, subsectors, planes               │
//! │  └── entity.rs   - Entities and their definitions            │
//! │                                                              │
//! │  partition/      - Spatial lookup                            │
//! │  ├── blockmap.rs - Uniform grid over lines and entities      │
//! │  └── bsp.rs      - Point to subsector                        │
//! │                                                              │
//! │  physics/        - Movement passes                           │
//! │  ├── opening.rs  - Vertical gap across a line                │
//! │  ├── linker.rs   - Spatial membership                        │
//! │  ├── vertical.rs - Floor/ceiling bounds, stacking, gravity   │
//! │  ├── horizontal.rs - Substeps, blocking, wall slide          │
//! │  ├── sector_mover.rs - Plane moves with group rollback       │
//! │  ├── use_trace.rs - Use line tracer                          │
//! │  └── events.rs   - Activation and crush notifications        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! - Entities are processed in ascending id order (BTreeMap)
//! - Spatial queries return id-sorted sets
//! - Ties in distance are broken by id
//! - No randomness, no system time
//!
//! Two worlds built from the same level and driven by the same calls end
//! with identical [`World::compute_hash`] values.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod config;
pub mod world;
pub mod partition;
pub mod physics;

// Re-export commonly used types
pub use config::{PhysicsConfig, MIN_ENTITY_RADIUS};
pub use crate::core::vec::{Vec2, Vec3};
pub use crate::core::geometry::{Box2, Box3, Seg2};
pub use world::{Entity, EntityDefinition, EntityId, LevelData, LevelError, RoomLevelBuilder, World};
pub use physics::{PhysicsEvent, PhysicsManager, SectorMoveRequest, SectorMoveStatus};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
