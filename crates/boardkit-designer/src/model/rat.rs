use boardkit_core::{BoundingBox, Coord, Point};
use serde::{Deserialize, Serialize};

use super::Geometry;

/// An unrouted connection hint between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatLine {
    pub p1: Point,
    pub p2: Point,
}

impl RatLine {
    pub fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }
}

impl Geometry for RatLine {
    fn bbox(&self) -> BoundingBox {
        let mut bbox = BoundingBox::at(self.p1);
        bbox.bump_point(self.p2);
        bbox
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
}
