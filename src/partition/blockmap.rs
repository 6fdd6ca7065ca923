//! Blockmap
//!
//! Uniform grid over the level used as the broad phase for every line and
//! entity query. Each cell lists the lines whose segment passes through it
//! and the entities whose box overlaps it.
//!
//! Iteration is callback based. The visitor returns an [`IterationStatus`];
//! `Stop` ends the walk immediately and is passed back to the caller.

use std::collections::BTreeSet;

use crate::core::geometry::{Box2, Seg2};
use crate::core::vec::Vec2;
use crate::world::entity::EntityId;
use crate::world::line::{Line, LineId};

/// Visitor result for grid walks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IterationStatus {
    /// Keep visiting
    Continue,
    /// Abort the walk
    Stop,
}

/// One grid cell.
#[derive(Clone, Debug, Default)]
pub struct Block {
    /// Lines passing through the cell
    pub lines: Vec<LineId>,
    /// Entities overlapping the cell
    pub entities: BTreeSet<EntityId>,
}

/// The grid.
#[derive(Clone, Debug)]
pub struct Blockmap {
    origin: Vec2,
    block_size: f64,
    width: usize,
    height: usize,
    blocks: Vec<Block>,
}

impl Blockmap {
    /// Build a grid covering `bounds` and insert every line.
    pub fn new(bounds: Box2, block_size: f64, lines: &[Line]) -> Self {
        debug_assert!(block_size > 0.0, "block size must be positive");

        let width = ((bounds.width() / block_size).floor() as usize + 1).max(1);
        let height = ((bounds.height() / block_size).floor() as usize + 1).max(1);

        let mut blockmap = Self {
            origin: bounds.min,
            block_size,
            width,
            height,
            blocks: vec![Block::default(); width * height],
        };

        for line in lines {
            let mut cells = Vec::new();
            blockmap.walk_segment(&line.segment, |index| {
                cells.push(index);
                IterationStatus::Continue
            });
            for index in cells {
                if !blockmap.blocks[index].lines.contains(&line.id) {
                    blockmap.blocks[index].lines.push(line.id);
                }
            }
        }

        blockmap
    }

    /// Grid width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell by flat index.
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Flat indices of every cell overlapping `b`, row-major.
    pub fn block_indices(&self, b: &Box2) -> Vec<usize> {
        let mut indices = Vec::new();
        self.walk_box(b, |index| {
            indices.push(index);
            IterationStatus::Continue
        });
        indices
    }

    /// Visit every cell overlapping `b` in row-major order.
    pub fn iterate_box<F>(&self, b: &Box2, mut visit: F) -> IterationStatus
    where
        F: FnMut(&Block) -> IterationStatus,
    {
        self.walk_box(b, |index| visit(&self.blocks[index]))
    }

    /// Visit every cell the segment passes through, from start to end.
    pub fn iterate_segment<F>(&self, seg: &Seg2, mut visit: F) -> IterationStatus
    where
        F: FnMut(&Block) -> IterationStatus,
    {
        self.walk_segment(seg, |index| visit(&self.blocks[index]))
    }

    /// Insert an entity into every cell its box overlaps. Returns the cells.
    pub fn link_entity(&mut self, id: EntityId, b: &Box2) -> Vec<usize> {
        let indices = self.block_indices(b);
        for &index in &indices {
            self.blocks[index].entities.insert(id);
        }
        indices
    }

    /// Remove an entity from the given cells.
    pub fn unlink_entity(&mut self, id: EntityId, blocks: &[usize]) {
        for &index in blocks {
            if let Some(block) = self.blocks.get_mut(index) {
                block.entities.remove(&id);
            }
        }
    }

    // =========================================================================
    // Cell walks
    // =========================================================================

    fn cell_of(&self, p: Vec2) -> (i64, i64) {
        (
            ((p.x - self.origin.x) / self.block_size).floor() as i64,
            ((p.y - self.origin.y) / self.block_size).floor() as i64,
        )
    }

    fn index_of(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    fn walk_box<F>(&self, b: &Box2, mut visit: F) -> IterationStatus
    where
        F: FnMut(usize) -> IterationStatus,
    {
        let (min_x, min_y) = self.cell_of(b.min);
        let (max_x, max_y) = self.cell_of(b.max);

        let min_x = min_x.max(0);
        let min_y = min_y.max(0);
        let max_x = max_x.min(self.width as i64 - 1);
        let max_y = max_y.min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if let Some(index) = self.index_of(x, y) {
                    if visit(index) == IterationStatus::Stop {
                        return IterationStatus::Stop;
                    }
                }
            }
        }

        IterationStatus::Continue
    }

    /// Grid traversal along the segment. When the segment passes exactly
    /// through a cell corner both side neighbours are visited.
    fn walk_segment<F>(&self, seg: &Seg2, mut visit: F) -> IterationStatus
    where
        F: FnMut(usize) -> IterationStatus,
    {
        let start = (seg.start - self.origin) / self.block_size;
        let end = (seg.end - self.origin) / self.block_size;

        let mut x = start.x.floor() as i64;
        let mut y = start.y.floor() as i64;
        let end_x = end.x.floor() as i64;
        let end_y = end.y.floor() as i64;

        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let step_x: i64 = if dx > 0.0 { 1 } else if dx < 0.0 { -1 } else { 0 };
        let step_y: i64 = if dy > 0.0 { 1 } else if dy < 0.0 { -1 } else { 0 };

        let t_delta_x = if dx != 0.0 { 1.0 / dx.abs() } else { f64::INFINITY };
        let t_delta_y = if dy != 0.0 { 1.0 / dy.abs() } else { f64::INFINITY };
        let mut t_max_x = if dx > 0.0 {
            (x as f64 + 1.0 - start.x) / dx
        } else if dx < 0.0 {
            (start.x - x as f64) / -dx
        } else {
            f64::INFINITY
        };
        let mut t_max_y = if dy > 0.0 {
            (y as f64 + 1.0 - start.y) / dy
        } else if dy < 0.0 {
            (start.y - y as f64) / -dy
        } else {
            f64::INFINITY
        };

        let mut visit_cell = |cx: i64, cy: i64| -> IterationStatus {
            match self.index_of(cx, cy) {
                Some(index) => visit(index),
                None => IterationStatus::Continue,
            }
        };

        // Every step moves one cell closer to the end cell.
        let max_steps = (end_x - x).unsigned_abs() + (end_y - y).unsigned_abs();
        for _ in 0..=max_steps {
            if visit_cell(x, y) == IterationStatus::Stop {
                return IterationStatus::Stop;
            }
            if x == end_x && y == end_y {
                break;
            }

            if t_max_x < t_max_y {
                x += step_x;
                t_max_x += t_delta_x;
            } else if t_max_y < t_max_x {
                y += step_y;
                t_max_y += t_delta_y;
            } else {
                if visit_cell(x + step_x, y) == IterationStatus::Stop
                    || visit_cell(x, y + step_y) == IterationStatus::Stop
                {
                    return IterationStatus::Stop;
                }
                x += step_x;
                y += step_y;
                t_max_x += t_delta_x;
                t_max_y += t_delta_y;
            }
        }

        IterationStatus::Continue
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::line::LineFlags;
    use crate::world::sector::SectorId;

    fn line(id: u32, x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
        Line {
            id: LineId(id),
            segment: Seg2::new(Vec2::new(x1, y1), Vec2::new(x2, y2)),
            front: SectorId(0),
            back: None,
            flags: LineFlags::default(),
            special: None,
            subsectors: Vec::new(),
            activated: false,
        }
    }

    fn bounds() -> Box2 {
        Box2::new(Vec2::new(0.0, 0.0), Vec2::new(512.0, 512.0))
    }

    fn lines_in(blockmap: &Blockmap, b: &Box2) -> BTreeSet<LineId> {
        let mut found = BTreeSet::new();
        blockmap.iterate_box(b, |block| {
            found.extend(block.lines.iter().copied());
            IterationStatus::Continue
        });
        found
    }

    #[test]
    fn test_grid_dimensions() {
        let blockmap = Blockmap::new(bounds(), 128.0, &[]);
        assert_eq!(blockmap.width(), 5);
        assert_eq!(blockmap.height(), 5);
    }

    #[test]
    fn test_line_inserted_along_path() {
        let lines = vec![line(0, 10.0, 10.0, 300.0, 10.0)];
        let blockmap = Blockmap::new(bounds(), 128.0, &lines);

        // Cells (0,0), (1,0), (2,0)
        for x in 0..3 {
            assert!(blockmap.block(x).unwrap().lines.contains(&LineId(0)));
        }
        assert!(blockmap.block(3).unwrap().lines.is_empty());
        assert!(blockmap.block(blockmap.width()).unwrap().lines.is_empty());
    }

    #[test]
    fn test_diagonal_line_cells() {
        let lines = vec![line(7, 10.0, 10.0, 500.0, 500.0)];
        let blockmap = Blockmap::new(bounds(), 128.0, &lines);

        let far = Box2::new(Vec2::new(400.0, 10.0), Vec2::new(500.0, 100.0));
        assert!(lines_in(&blockmap, &far).is_empty());

        let near = Box2::new(Vec2::new(250.0, 250.0), Vec2::new(260.0, 260.0));
        assert!(lines_in(&blockmap, &near).contains(&LineId(7)));
    }

    #[test]
    fn test_iterate_box_stops_early() {
        let blockmap = Blockmap::new(bounds(), 128.0, &[]);
        let mut visited = 0;
        let status = blockmap.iterate_box(&bounds(), |_| {
            visited += 1;
            if visited == 3 {
                IterationStatus::Stop
            } else {
                IterationStatus::Continue
            }
        });

        assert_eq!(status, IterationStatus::Stop);
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_iterate_segment_visits_in_order() {
        let blockmap = Blockmap::new(bounds(), 128.0, &[]);
        let mut cells = Vec::new();
        blockmap.walk_segment(&Seg2::new(Vec2::new(500.0, 64.0), Vec2::new(64.0, 64.0)), |i| {
            cells.push(i);
            IterationStatus::Continue
        });
        assert_eq!(cells, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_entity_link_unlink() {
        let mut blockmap = Blockmap::new(bounds(), 128.0, &[]);
        let b = Box2::from_center(Vec2::new(128.0, 128.0), 16.0);

        let cells = blockmap.link_entity(EntityId(4), &b);
        assert_eq!(cells.len(), 4);
        for &cell in &cells {
            assert!(blockmap.block(cell).unwrap().entities.contains(&EntityId(4)));
        }

        blockmap.unlink_entity(EntityId(4), &cells);
        for &cell in &cells {
            assert!(blockmap.block(cell).unwrap().entities.is_empty());
        }
    }

    #[test]
    fn test_out_of_range_box_is_clamped() {
        let blockmap = Blockmap::new(bounds(), 128.0, &[]);
        let huge = Box2::new(Vec2::new(-1000.0, -1000.0), Vec2::new(-500.0, -500.0));
        assert!(blockmap.block_indices(&huge).is_empty());
    }
}
