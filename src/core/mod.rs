//! Core geometric primitives.
//!
//! Value types and predicates shared by the world model, the spatial
//! partition and the physics passes, plus deterministic state hashing.

pub mod vec;
pub mod geometry;
pub mod hash;

// Re-export core types
pub use vec::{Vec2, Vec3};
pub use geometry::{Box2, Box3, Seg2};
pub use hash::{compute_state_hash, StateHash, StateHasher};
