//! BSP Tree
//!
//! Point location: descends splitters to the convex leaf (subsector)
//! containing a point. The right side of a splitter is the front child;
//! points exactly on a splitter go front.

use serde::{Serialize, Deserialize};

use crate::core::geometry::Seg2;
use crate::core::vec::Vec2;
use crate::world::sector::SubsectorId;

/// A child link of a BSP node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BspChild {
    /// Interior node by index
    Node(u32),
    /// Leaf
    Subsector(SubsectorId),
}

/// Interior node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BspNode {
    /// Partition line
    pub splitter: Seg2,
    /// Child on the right of the splitter
    pub front: BspChild,
    /// Child on the left of the splitter
    pub back: BspChild,
}

/// The tree.
#[derive(Clone, Debug)]
pub struct BspTree {
    nodes: Vec<BspNode>,
    root: BspChild,
}

impl BspTree {
    /// Create a tree. Callers validate indices first (see `World::from_level`).
    pub fn new(nodes: Vec<BspNode>, root: BspChild) -> Self {
        Self { nodes, root }
    }

    /// Root link.
    pub fn root(&self) -> BspChild {
        self.root
    }

    /// All nodes.
    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    /// Leaf containing `point`.
    pub fn find_subsector(&self, point: Vec2) -> SubsectorId {
        let mut child = self.root;
        loop {
            match child {
                BspChild::Subsector(id) => return id,
                BspChild::Node(index) => {
                    let node = &self.nodes[index as usize];
                    child = if node.splitter.on_right(point) { node.front } else { node.back };
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
