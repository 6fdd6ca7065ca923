//! Spatial partition: blockmap broad phase and BSP point location.

pub mod blockmap;
pub mod bsp;

pub use blockmap::{Block, Blockmap, IterationStatus};
pub use bsp::{BspChild, BspNode, BspTree};
