//! Physics Configuration
//!
//! Tunables for the movement passes. Every field has a default matching the
//! classic engine feel, and a partial JSON file may override any subset.

use serde::{Serialize, Deserialize};

/// Smallest radius an actor may have. Substeps are bounded by
/// `radius - MIN_ENTITY_RADIUS`, which must stay positive.
pub const MIN_ENTITY_RADIUS: f64 = 0.5;

/// Configuration for the physics core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward velocity added per tick while airborne
    pub gravity: f64,
    /// Velocity multiplier applied to grounded actors and to slides
    pub friction: f64,
    /// Wall slides allowed per move
    pub max_slides: u32,
    /// Distance fraction backed off from a wall hit before sliding
    pub slide_step_back: f64,
    /// Velocity components below this are snapped to zero
    pub min_movement: f64,
    /// Reach of the use trace
    pub use_distance: f64,
    /// Lowering floors slower than this carry grounded actors down with them
    pub stick_to_floor_speed: f64,
    /// Blockmap cell edge length
    pub block_size: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 1.0,
            friction: 0.90625,       // 0xE800 / 0x10000
            max_slides: 3,
            slide_step_back: 1.0 / 32.0,
            min_movement: 0.06,
            use_distance: 64.0,
            stick_to_floor_speed: 9.0,
            block_size: 128.0,
        }
    }
}

impl PhysicsConfig {
    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// =============================================================================
// TESTS
// =============================================================================
