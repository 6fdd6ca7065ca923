//! Segments and Boxes
//!
//! The geometric predicates every other module builds on. Box overlap and
//! segment/box intersection are strict: touching edges do not count, which
//! lets an actor rest flush against a wall without being considered inside it.

use serde::{Serialize, Deserialize};
use super::vec::{Vec2, Vec3};

// =============================================================================
// SEGMENT
// =============================================================================

/// Directed 2D segment. The right side of the direction is the front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Seg2 {
    /// Start vertex
    pub start: Vec2,
    /// End vertex
    pub end: Vec2,
}

impl Seg2 {
    /// Create a new segment.
    #[inline]
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// `end - start`.
    #[inline]
    pub fn delta(&self) -> Vec2 {
        self.end - self.start
    }

    /// Length of the segment.
    #[inline]
    pub fn length(&self) -> f64 {
        self.delta().length()
    }

    /// Signed side value: negative on the right, positive on the left.
    #[inline]
    pub fn side_value(&self, point: Vec2) -> f64 {
        self.delta().cross(point - self.start)
    }

    /// True if `point` is on the right (front) side or exactly on the line.
    #[inline]
    pub fn on_right(&self, point: Vec2) -> bool {
        self.side_value(point) <= 0.0
    }

    /// True if the two points lie on different sides.
    #[inline]
    pub fn different_sides(&self, a: Vec2, b: Vec2) -> bool {
        self.on_right(a) != self.on_right(b)
    }

    /// Bounding box of the segment.
    #[inline]
    pub fn bbox(&self) -> Box2 {
        Box2::new(
            Vec2::new(self.start.x.min(self.end.x), self.start.y.min(self.end.y)),
            Vec2::new(self.start.x.max(self.end.x), self.start.y.max(self.end.y)),
        )
    }

    /// Parametric time along `self` where it meets `other`.
    ///
    /// Returns `None` for parallel segments or when the crossing point lies
    /// outside either segment.
    pub fn intersection_time(&self, other: &Seg2) -> Option<f64> {
        let d = self.delta();
        let e = other.delta();
        let denom = d.cross(e);
        if denom == 0.0 {
            return None;
        }

        let w = other.start - self.start;
        let t = w.cross(e) / denom;
        let u = w.cross(d) / denom;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(t)
        } else {
            None
        }
    }

    /// True if the segments cross (endpoints included).
    #[inline]
    pub fn intersects(&self, other: &Seg2) -> bool {
        self.intersection_time(other).is_some()
    }

    /// True if the segment passes through the interior of `b`.
    pub fn intersects_box(&self, b: &Box2) -> bool {
        if !b.overlaps(&self.bbox()) && !self.is_axis_aligned() {
            return false;
        }

        if self.start.x == self.end.x {
            return b.min.x < self.start.x
                && self.start.x < b.max.x
                && self.bbox().min.y < b.max.y
                && self.bbox().max.y > b.min.y;
        }
        if self.start.y == self.end.y {
            return b.min.y < self.start.y
                && self.start.y < b.max.y
                && self.bbox().min.x < b.max.x
                && self.bbox().max.x > b.min.x;
        }

        // The diagonal facing the segment decides.
        if (self.start.x < self.end.x) ^ (self.start.y < self.end.y) {
            self.different_sides(b.bottom_left(), b.top_right())
        } else {
            self.different_sides(b.top_left(), b.bottom_right())
        }
    }

    #[inline]
    fn is_axis_aligned(&self) -> bool {
        self.start.x == self.end.x || self.start.y == self.end.y
    }
}

// =============================================================================
// BOXES
// =============================================================================

/// Axis-aligned 2D box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Box2 {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Box2 {
    /// Create a box from its corners.
    #[inline]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Square box of half-width `radius` around `center`.
    #[inline]
    pub fn from_center(center: Vec2, radius: f64) -> Self {
        Self::new(
            Vec2::new(center.x - radius, center.y - radius),
            Vec2::new(center.x + radius, center.y + radius),
        )
    }

    /// Width along X.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height along Y.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Strict overlap: shared edges do not count.
    #[inline]
    pub fn overlaps(&self, other: &Box2) -> bool {
        !(self.min.x >= other.max.x
            || self.max.x <= other.min.x
            || self.min.y >= other.max.y
            || self.max.y <= other.min.y)
    }

    /// Point inside or on the border.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Smallest box containing both.
    #[inline]
    pub fn union(&self, other: &Box2) -> Box2 {
        Box2::new(
            Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    /// Corner (min.x, max.y)
    #[inline]
    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.min.x, self.max.y)
    }

    /// Corner (max.x, max.y)
    #[inline]
    pub fn top_right(&self) -> Vec2 {
        self.max
    }

    /// Corner (min.x, min.y)
    #[inline]
    pub fn bottom_left(&self) -> Vec2 {
        self.min
    }

    /// Corner (max.x, min.y)
    #[inline]
    pub fn bottom_right(&self) -> Vec2 {
        Vec2::new(self.max.x, self.min.y)
    }
}

/// Axis-aligned 3D box. `min.z` is the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box3 {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Box3 {
    /// Box of an actor standing at `position` (z = bottom).
    #[inline]
    pub fn from_bottom_center(position: Vec3, radius: f64, height: f64) -> Self {
        Self {
            min: Vec3::new(position.x - radius, position.y - radius, position.z),
            max: Vec3::new(position.x + radius, position.y + radius, position.z + height),
        }
    }

    /// Horizontal footprint.
    #[inline]
    pub fn xy(&self) -> Box2 {
        Box2::new(self.min.xy(), self.max.xy())
    }

    /// Strict 3D overlap.
    #[inline]
    pub fn overlaps(&self, other: &Box3) -> bool {
        self.xy().overlaps(&other.xy()) && self.min.z < other.max.z && self.max.z > other.min.z
    }
}

// =============================================================================
// TESTS
// =============================================================================
