use boardkit_core::{BoundingBox, Coord, Point};
use serde::{Deserialize, Serialize};

use super::{replace_coord, Geometry};

/// A round pad stack (via or through-hole pad).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadStack {
    pub pos: Point,
    pub diameter: Coord,
    pub hole: Coord,
    #[serde(default)]
    pub clearance: Coord,
    #[serde(default)]
    pub rotation: f64,
}

impl PadStack {
    pub fn via(pos: Point, diameter: Coord, hole: Coord) -> Self {
        Self {
            pos,
            diameter,
            hole,
            clearance: 0,
            rotation: 0.0,
        }
    }

    pub fn with_clearance(mut self, clearance: Coord) -> Self {
        self.clearance = clearance;
        self
    }
}

impl Geometry for PadStack {
    fn bbox(&self) -> BoundingBox {
        BoundingBox::at(self.pos).bloated(self.diameter / 2)
    }

    fn translate(&mut self, dx: Coord, dy: Coord) {
        self.pos = self.pos.translated(dx, dy);
    }

    fn rotate90(&mut self, center: Point, steps: u8) {
        self.pos = self.pos.rotated90(center, steps);
        self.rotation = (self.rotation + 90.0 * f64::from(steps % 4)) % 360.0;
    }

    fn rotate(&mut self, center: Point, cos_a: f64, sin_a: f64, angle_deg: f64) {
        self.pos = self.pos.rotated(center, cos_a, sin_a);
        self.rotation = (self.rotation + angle_deg) % 360.0;
    }

    fn size(&self) -> Option<Coord> {
        Some(self.diameter)
    }

    fn set_size(&mut self, value: Coord) -> bool {
        replace_coord(&mut self.diameter, value)
    }

    fn clearance(&self) -> Option<Coord> {
        Some(self.clearance)
    }

    fn set_clearance(&mut self, value: Coord) -> bool {
        replace_coord(&mut self.clearance, value)
    }
}
