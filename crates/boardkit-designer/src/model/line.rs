use boardkit_core::{BoundingBox, Coord, Point};
use serde::{Deserialize, Serialize};

use super::{replace_coord, Geometry};

/// A straight trace segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
    pub thickness: Coord,
    #[serde(default)]
    pub clearance: Coord,
}

impl Line {
    pub fn new(p1: Point, p2: Point, thickness: Coord) -> Self {
        Self {
            p1,
            p2,
            thickness,
            clearance: 0,
        }
    }

    pub fn with_clearance(mut self, clearance: Coord) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn length(&self) -> f64 {
        self.p1.distance_to(&self.p2)
    }
}

impl Geometry for Line {
    fn bbox(&self) -> BoundingBox {
        let mut bbox = BoundingBox::at(self.p1);
        bbox.bump_point(self.p2);
        bbox.bloated(self.thickness / 2)
    }

    fn translate(&mut self, dx: Coord, dy: Coord) {
        self.p1 = self.p1.translated(dx, dy);
        self.p2 = self.p2.translated(dx, dy);
    }

    fn rotate90(&mut self, center: Point, steps: u8) {
        self.p1 = self.p1.rotated90(center, steps);
        self.p2 = self.p2.rotated90(center, steps);
    }

    fn rotate(&mut self, center: Point, cos_a: f64, sin_a: f64, _angle_deg: f64) {
        self.p1 = self.p1.rotated(center, cos_a, sin_a);
        self.p2 = self.p2.rotated(center, cos_a, sin_a);
    }

    fn size(&self) -> Option<Coord> {
        Some(self.thickness)
    }

    fn set_size(&mut self, value: Coord) -> bool {
        replace_coord(&mut self.thickness, value)
    }

    fn clearance(&self) -> Option<Coord> {
        Some(self.clearance)
    }

    fn set_clearance(&mut self, value: Coord) -> bool {
        replace_coord(&mut self.clearance, value)
    }
}
