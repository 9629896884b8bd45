//! Points and axis-aligned bounding boxes in board coordinates.

use crate::units::Coord;
use serde::{Deserialize, Serialize};

/// A point in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    pub fn translated(self, dx: Coord, dy: Coord) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Rotates by `steps` quarter turns counter-clockwise around `center`.
    pub fn rotated90(self, center: Point, steps: u8) -> Self {
        let (mut dx, mut dy) = (self.x - center.x, self.y - center.y);
        for _ in 0..(steps % 4) {
            (dx, dy) = (-dy, dx);
        }
        Self::new(center.x + dx, center.y + dy)
    }

    /// Rotates by an arbitrary angle given as its cosine and sine.
    pub fn rotated(self, center: Point, cos_a: f64, sin_a: f64) -> Self {
        let dx = (self.x - center.x) as f64;
        let dy = (self.y - center.y) as f64;
        Self::new(
            center.x + (dx * cos_a - dy * sin_a).round() as Coord,
            center.y + (dx * sin_a + dy * cos_a).round() as Coord,
        )
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An axis-aligned box with inclusive corners.
///
/// `BoundingBox::inverted()` is the empty sentinel: bumping it with any box
/// yields that box, so recomputation can start from nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: Coord,
    pub y1: Coord,
    pub x2: Coord,
    pub y2: Coord,
}

impl BoundingBox {
    pub fn new(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// The empty sentinel.
    pub fn inverted() -> Self {
        Self {
            x1: Coord::MAX,
            y1: Coord::MAX,
            x2: Coord::MIN,
            y2: Coord::MIN,
        }
    }

    /// Box covering a single point.
    pub fn at(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    /// Smallest box covering all `points`, or `None` if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut bbox = Self::inverted();
        for p in points {
            bbox.bump_point(*p);
        }
        (!bbox.is_empty()).then_some(bbox)
    }

    pub fn is_empty(&self) -> bool {
        self.x1 > self.x2 || self.y1 > self.y2
    }

    /// Grows the box to cover `other`. Empty boxes leave it unchanged.
    pub fn bump(&mut self, other: &BoundingBox) {
        if other.is_empty() {
            return;
        }
        self.x1 = self.x1.min(other.x1);
        self.y1 = self.y1.min(other.y1);
        self.x2 = self.x2.max(other.x2);
        self.y2 = self.y2.max(other.y2);
    }

    pub fn bump_point(&mut self, p: Point) {
        self.bump(&Self::at(p));
    }

    /// Normalizes the box so that min <= max on both axes.
    ///
    /// A box that was never bumped collapses to the `fallback` point.
    pub fn close(&mut self, fallback: Point) {
        if self.x1 == Coord::MAX && self.x2 == Coord::MIN {
            *self = Self::at(fallback);
            return;
        }
        if self.x1 > self.x2 {
            std::mem::swap(&mut self.x1, &mut self.x2);
        }
        if self.y1 > self.y2 {
            std::mem::swap(&mut self.y1, &mut self.y2);
        }
    }

    /// The box grown by `amount` on every side.
    pub fn bloated(&self, amount: Coord) -> Self {
        Self::new(
            self.x1.saturating_sub(amount),
            self.y1.saturating_sub(amount),
            self.x2.saturating_add(amount),
            self.y2.saturating_add(amount),
        )
    }

    pub fn translated(&self, dx: Coord, dy: Coord) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x1 <= other.x2
            && other.x1 <= self.x2
            && self.y1 <= other.y2
            && other.y1 <= self.y2
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }

    pub fn width(&self) -> Coord {
        self.x2 - self.x1
    }

    pub fn height(&self) -> Coord {
        self.y2 - self.y1
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::inverted()
    }
}
