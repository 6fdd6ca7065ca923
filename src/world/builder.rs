//! Room Level Builder
//!
//! Produces valid [`LevelData`] from axis-aligned rectangular rooms. Each room
//! becomes one sector and one subsector. Edges shared between rooms become
//! two-sided lines (front is the lower-indexed room), the rest become walls.
//! The BSP is built by recursive axis-aligned cuts between rooms.
//!
//! ```text
//!   +--------+--------+
//!   | room 0 | room 1 |      shared edge -> two-sided line
//!   |        |        |      outer edges -> one-sided walls
//!   +--------+--------+
//! ```

use std::collections::BTreeMap;

use crate::core::geometry::{Box2, Seg2};
use crate::core::vec::Vec2;
use crate::partition::bsp::{BspChild, BspNode};
use super::level::{LevelData, LevelError, LineData, SectorData, SubsectorData};
use super::line::{LineFlags, LineSpecial};
use super::sector::SubsectorId;

/// One side of a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum WallSide {
    /// min y
    South,
    /// min x
    West,
    /// max y
    North,
    /// max x
    East,
}

impl WallSide {
    /// Sides in clockwise order, which keeps the interior on each line's right.
    const CLOCKWISE: [WallSide; 4] = [WallSide::South, WallSide::West, WallSide::North, WallSide::East];
}

#[derive(Clone, Debug)]
struct Room {
    bounds: Box2,
    floor_z: f64,
    ceiling_z: f64,
    tag: u32,
}

#[derive(Clone, Copy, Debug, Default)]
struct Attachment {
    flags: LineFlags,
    special: Option<LineSpecial>,
}

/// Builder for rectilinear levels.
#[derive(Clone, Debug, Default)]
pub struct RoomLevelBuilder {
    name: String,
    rooms: Vec<Room>,
    portals: BTreeMap<(usize, usize), Attachment>,
    walls: BTreeMap<(usize, WallSide), Attachment>,
}

impl RoomLevelBuilder {
    /// Start an empty level.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Add a room and return its index (also its sector id).
    pub fn add_room(&mut self, min: Vec2, max: Vec2, floor_z: f64, ceiling_z: f64) -> usize {
        self.rooms.push(Room {
            bounds: Box2::new(min, max),
            floor_z,
            ceiling_z,
            tag: 0,
        });
        self.rooms.len() - 1
    }

    /// Set a room's sector tag.
    pub fn set_tag(&mut self, room: usize, tag: u32) -> Result<&mut Self, LevelError> {
        self.room_mut(room)?.tag = tag;
        Ok(self)
    }

    /// Attach a special to every line between two rooms.
    pub fn portal_special(&mut self, a: usize, b: usize, special: LineSpecial) -> Result<&mut Self, LevelError> {
        self.portal_entry(a, b)?.special = Some(special);
        Ok(self)
    }

    /// Set blocking flags on every line between two rooms.
    pub fn portal_flags(&mut self, a: usize, b: usize, flags: LineFlags) -> Result<&mut Self, LevelError> {
        self.portal_entry(a, b)?.flags = flags;
        Ok(self)
    }

    /// Attach a special to the walls on one side of a room.
    pub fn wall_special(&mut self, room: usize, side: WallSide, special: LineSpecial) -> Result<&mut Self, LevelError> {
        self.room_mut(room)?;
        self.walls.entry((room, side)).or_default().special = Some(special);
        Ok(self)
    }

    /// Produce level data.
    pub fn build(&self) -> Result<LevelData, LevelError> {
        if self.rooms.is_empty() {
            return Err(LevelError::Empty("rooms"));
        }
        for (index, room) in self.rooms.iter().enumerate() {
            if room.bounds.width() <= 0.0 || room.bounds.height() <= 0.0 {
                return Err(LevelError::EmptyRoom(index));
            }
            for (other_index, other) in self.rooms.iter().enumerate().skip(index + 1) {
                if room.bounds.overlaps(&other.bounds) {
                    return Err(LevelError::RoomOverlap(index, other_index));
                }
            }
        }

        let mut lines = Vec::new();
        let mut room_lines: Vec<Vec<u32>> = vec![Vec::new(); self.rooms.len()];

        for (index, room) in self.rooms.iter().enumerate() {
            for side in WallSide::CLOCKWISE {
                for (lo, hi, neighbour) in self.edge_pieces(index, side) {
                    let (attachment, back) = match neighbour {
                        // The lower-indexed room emits shared lines.
                        Some(other) if other < index => continue,
                        Some(other) => (self.portals.get(&(index, other)).copied(), Some(other)),
                        None => (self.walls.get(&(index, side)).copied(), None),
                    };
                    let attachment = attachment.unwrap_or_default();
                    let segment = edge_segment(&room.bounds, side, lo, hi);

                    let line_index = lines.len() as u32;
                    lines.push(LineData {
                        start: segment.start,
                        end: segment.end,
                        front: index as u32,
                        back: back.map(|b| b as u32),
                        flags: attachment.flags,
                        special: attachment.special,
                    });
                    room_lines[index].push(line_index);
                    if let Some(other) = back {
                        room_lines[other].push(line_index);
                    }
                }
            }
        }

        let sectors = self
            .rooms
            .iter()
            .map(|room| SectorData {
                floor_z: room.floor_z,
                ceiling_z: room.ceiling_z,
                tag: room.tag,
                special: 0,
            })
            .collect();

        let subsectors = room_lines
            .into_iter()
            .enumerate()
            .map(|(index, lines)| SubsectorData { sector: index as u32, lines })
            .collect();

        let mut nodes = Vec::new();
        let all: Vec<usize> = (0..self.rooms.len()).collect();
        let root = self.partition(&all, &mut nodes)?;

        let level = LevelData {
            name: self.name.clone(),
            sectors,
            lines,
            subsectors,
            nodes,
            root,
        };
        level.validate()?;
        Ok(level)
    }

    fn room_mut(&mut self, room: usize) -> Result<&mut Room, LevelError> {
        self.rooms.get_mut(room).ok_or(LevelError::UnknownRoom(room))
    }

    fn portal_entry(&mut self, a: usize, b: usize) -> Result<&mut Attachment, LevelError> {
        self.room_mut(a)?;
        self.room_mut(b)?;
        Ok(self.portals.entry((a.min(b), a.max(b))).or_default())
    }

    /// Split one side of a room into ascending pieces, each either shared
    /// with a neighbour or a plain wall.
    fn edge_pieces(&self, index: usize, side: WallSide) -> Vec<(f64, f64, Option<usize>)> {
        let b = &self.rooms[index].bounds;
        let (fixed, lo, hi) = match side {
            WallSide::South => (b.min.y, b.min.x, b.max.x),
            WallSide::North => (b.max.y, b.min.x, b.max.x),
            WallSide::West => (b.min.x, b.min.y, b.max.y),
            WallSide::East => (b.max.x, b.min.y, b.max.y),
        };

        let mut shared: Vec<(f64, f64, usize)> = self
            .rooms
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .filter_map(|(other, room)| {
                let o = &room.bounds;
                let (touches, o_lo, o_hi) = match side {
                    WallSide::South => (o.max.y == fixed, o.min.x, o.max.x),
                    WallSide::North => (o.min.y == fixed, o.min.x, o.max.x),
                    WallSide::West => (o.max.x == fixed, o.min.y, o.max.y),
                    WallSide::East => (o.min.x == fixed, o.min.y, o.max.y),
                };
                let (s_lo, s_hi) = (lo.max(o_lo), hi.min(o_hi));
                (touches && s_lo < s_hi).then_some((s_lo, s_hi, other))
            })
            .collect();
        shared.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut pieces = Vec::new();
        let mut cursor = lo;
        for (s_lo, s_hi, other) in shared {
            if s_lo > cursor {
                pieces.push((cursor, s_lo, None));
            }
            pieces.push((s_lo, s_hi, Some(other)));
            cursor = s_hi;
        }
        if cursor < hi {
            pieces.push((cursor, hi, None));
        }
        pieces
    }

    /// Recursive guillotine cut. Children are pushed before their parent.
    fn partition(&self, rooms: &[usize], nodes: &mut Vec<BspNode>) -> Result<BspChild, LevelError> {
        if let [only] = rooms {
            return Ok(BspChild::Subsector(SubsectorId(*only as u32)));
        }

        let (splitter, front, back) = self.find_cut(rooms).ok_or(LevelError::NotPartitionable)?;
        let front = self.partition(&front, nodes)?;
        let back = self.partition(&back, nodes)?;
        nodes.push(BspNode { splitter, front, back });
        Ok(BspChild::Node(nodes.len() as u32 - 1))
    }

    /// First axis-aligned line (x cuts before y cuts) with every room on
    /// one side and both sides non-empty.
    fn find_cut(&self, rooms: &[usize]) -> Option<(Seg2, Vec<usize>, Vec<usize>)> {
        let bounds = |r: &usize| self.rooms[*r].bounds;

        let mut xs: Vec<f64> = rooms.iter().map(|r| bounds(r).min.x).collect();
        xs.sort_by(f64::total_cmp);
        for c in xs {
            let (front, back): (Vec<usize>, Vec<usize>) = rooms.iter().copied().partition(|r| bounds(r).min.x >= c);
            if !front.is_empty() && !back.is_empty() && back.iter().all(|r| bounds(r).max.x <= c) {
                // Pointing +y: the front is x >= c.
                let splitter = Seg2::new(Vec2::new(c, 0.0), Vec2::new(c, 1.0));
                return Some((splitter, front, back));
            }
        }

        let mut ys: Vec<f64> = rooms.iter().map(|r| bounds(r).min.y).collect();
        ys.sort_by(f64::total_cmp);
        for c in ys {
            let (front, back): (Vec<usize>, Vec<usize>) = rooms.iter().copied().partition(|r| bounds(r).min.y >= c);
            if !front.is_empty() && !back.is_empty() && back.iter().all(|r| bounds(r).max.y <= c) {
                // Pointing -x: the front is y >= c.
                let splitter = Seg2::new(Vec2::new(0.0, c), Vec2::new(-1.0, c));
                return Some((splitter, front, back));
            }
        }

        None
    }
}

/// Directed piece of a room edge with the room's interior on the right.
fn edge_segment(b: &Box2, side: WallSide, lo: f64, hi: f64) -> Seg2 {
    match side {
        WallSide::South => Seg2::new(Vec2::new(hi, b.min.y), Vec2::new(lo, b.min.y)),
        WallSide::West => Seg2::new(Vec2::new(b.min.x, lo), Vec2::new(b.min.x, hi)),
        WallSide::North => Seg2::new(Vec2::new(lo, b.max.y), Vec2::new(hi, b.max.y)),
        WallSide::East => Seg2::new(Vec2::new(b.max.x, hi), Vec2::new(b.max.x, lo)),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::line::LineActivation;

    #[test]
    fn test_single_room_walls_face_inward() {
        let mut builder = RoomLevelBuilder::new("box");
        builder.add_room(Vec2::new(0.0, 0.0), Vec2::new(128.0, 64.0), 0.0, 128.0);
        let level = builder.build().unwrap();

        assert_eq!(level.lines.len(), 4);
        assert_eq!(level.root, BspChild::Subsector(SubsectorId(0)));

        let center = Vec2::new(64.0, 32.0);
        for line in &level.lines {
            assert!(line.back.is_none());
            assert!(Seg2::new(line.start, line.end).on_right(center));
        }
    }

    #[test]
    fn test_shared_edge_split_around_neighbour() {
        // Wide room with a narrow room above its middle
        let mut builder = RoomLevelBuilder::new("t");
        let wide = builder.add_room(Vec2::new(0.0, 0.0), Vec2::new(300.0, 100.0), 0.0, 128.0);
        let narrow = builder.add_room(Vec2::new(100.0, 100.0), Vec2::new(200.0, 200.0), 0.0, 128.0);
        let level = builder.build().unwrap();

        let portals: Vec<_> = level.lines.iter().filter(|l| l.back.is_some()).collect();
        assert_eq!(portals.len(), 1);
        assert_eq!(portals[0].front, wide as u32);
        assert_eq!(portals[0].back, Some(narrow as u32));
        assert_eq!(portals[0].start, Vec2::new(100.0, 100.0));
        assert_eq!(portals[0].end, Vec2::new(200.0, 100.0));

        // Wide room north side: wall, portal, wall
        let north_walls = level
            .lines
            .iter()
            .filter(|l| l.back.is_none() && l.start.y == 100.0 && l.end.y == 100.0)
            .count();
        assert_eq!(north_walls, 2);
    }

    #[test]
    fn test_bsp_locates_rooms() {
        let mut builder = RoomLevelBuilder::new("grid");
        builder.add_room(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0), 0.0, 128.0);
        builder.add_room(Vec2::new(100.0, 0.0), Vec2::new(200.0, 100.0), 0.0, 128.0);
        builder.add_room(Vec2::new(0.0, 100.0), Vec2::new(200.0, 200.0), 0.0, 128.0);
        let level = builder.build().unwrap();

        let tree = crate::partition::bsp::BspTree::new(level.nodes.clone(), level.root);
        assert_eq!(tree.find_subsector(Vec2::new(50.0, 50.0)), SubsectorId(0));
        assert_eq!(tree.find_subsector(Vec2::new(150.0, 50.0)), SubsectorId(1));
        assert_eq!(tree.find_subsector(Vec2::new(150.0, 150.0)), SubsectorId(2));
        assert_eq!(tree.find_subsector(Vec2::new(20.0, 180.0)), SubsectorId(2));
    }

    #[test]
    fn test_attachments() {
        let mut builder = RoomLevelBuilder::new("doors");
        let a = builder.add_room(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0), 0.0, 128.0);
        let b = builder.add_room(Vec2::new(100.0, 0.0), Vec2::new(200.0, 100.0), 0.0, 128.0);
        let special = LineSpecial {
            kind: 11,
            activation: LineActivation::PlayerCross,
            repeat: false,
            sector_tag: 2,
        };
        builder
            .portal_special(b, a, special)
            .unwrap()
            .wall_special(a, WallSide::West, special)
            .unwrap()
            .set_tag(b, 2)
            .unwrap();
        let level = builder.build().unwrap();

        assert_eq!(level.lines.iter().filter(|l| l.special.is_some()).count(), 2);
        assert_eq!(level.sectors[b].tag, 2);
    }

    #[test]
    fn test_builder_errors() {
        let mut builder = RoomLevelBuilder::new("bad");
        assert!(matches!(builder.build(), Err(LevelError::Empty(_))));

        builder.add_room(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0), 0.0, 128.0);
        builder.add_room(Vec2::new(50.0, 50.0), Vec2::new(150.0, 150.0), 0.0, 128.0);
        assert!(matches!(builder.build(), Err(LevelError::RoomOverlap(0, 1))));
        assert!(matches!(builder.set_tag(7, 1), Err(LevelError::UnknownRoom(7))));
    }
}
