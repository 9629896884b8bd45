use boardkit_core::{BoundingBox, Coord, ObjectId, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{replace_coord, Geometry};

/// A filled copper polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
    #[serde(default)]
    pub clearance: Coord,
    /// Objects currently cut out of this polygon.
    #[serde(default)]
    pub clipped_by: BTreeSet<ObjectId>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            clearance: 0,
            clipped_by: BTreeSet::new(),
        }
    }

    /// Axis-aligned rectangle polygon.
    pub fn rect(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Self {
        Self::new(vec![
            Point::new(x1, y1),
            Point::new(x2, y1),
            Point::new(x2, y2),
            Point::new(x1, y2),
        ])
    }
}

impl Geometry for Polygon {
    fn bbox(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points).unwrap_or_else(BoundingBox::inverted)
    }

    fn translate(&mut self, dx: Coord, dy: Coord) {
        for p in &mut self.points {
            *p = p.translated(dx, dy);
        }
    }

    fn rotate90(&mut self, center: Point, steps: u8) {
        for p in &mut self.points {
            *p = p.rotated90(center, steps);
        }
    }

    fn rotate(&mut self, center: Point, cos_a: f64, sin_a: f64, _angle_deg: f64) {
        for p in &mut self.points {
            *p = p.rotated(center, cos_a, sin_a);
        }
    }

    fn clearance(&self) -> Option<Coord> {
        Some(self.clearance)
    }

    fn set_clearance(&mut self, value: Coord) -> bool {
        replace_coord(&mut self.clearance, value)
    }
}
