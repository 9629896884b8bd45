use boardkit_core::{BoundingBox, Coord, Point};
use serde::{Deserialize, Serialize};

use super::{replace_coord, Geometry};

/// Width of one glyph cell relative to the text height, in percent.
const GLYPH_ASPECT_PERCENT: Coord = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub anchor: Point,
    pub string: String,
    /// Glyph height.
    pub height: Coord,
    /// Degrees counter-clockwise around the anchor.
    pub rotation: f64,
    pub thickness: Coord,
}

impl Text {
    pub fn new(anchor: Point, string: impl Into<String>, height: Coord) -> Self {
        Self {
            anchor,
            string: string.into(),
            height,
            rotation: 0.0,
            thickness: 0,
        }
    }

    fn corners(&self) -> [Point; 4] {
        let width = self.string.chars().count() as Coord * self.height * GLYPH_ASPECT_PERCENT / 100;
        let a = self.anchor;
        let (cos_a, sin_a) = {
            let r = self.rotation.to_radians();
            (r.cos(), r.sin())
        };
        [
            a,
            Point::new(a.x + width, a.y).rotated(a, cos_a, sin_a),
            Point::new(a.x + width, a.y + self.height).rotated(a, cos_a, sin_a),
            Point::new(a.x, a.y + self.height).rotated(a, cos_a, sin_a),
        ]
    }
}

impl Geometry for Text {
    fn bbox(&self) -> BoundingBox {
        BoundingBox::from_points(&self.corners())
            .unwrap_or_else(|| BoundingBox::at(self.anchor))
            .bloated(self.thickness / 2)
    }

    fn translate(&mut self, dx: Coord, dy: Coord) {
        self.anchor = self.anchor.translated(dx, dy);
    }

    fn rotate90(&mut self, center: Point, steps: u8) {
        self.anchor = self.anchor.rotated90(center, steps);
        self.rotation = (self.rotation + 90.0 * f64::from(steps % 4)) % 360.0;
    }

    fn rotate(&mut self, center: Point, cos_a: f64, sin_a: f64, angle_deg: f64) {
        self.anchor = self.anchor.rotated(center, cos_a, sin_a);
        self.rotation = (self.rotation + angle_deg) % 360.0;
    }

    fn size(&self) -> Option<Coord> {
        Some(self.height)
    }

    fn set_size(&mut self, value: Coord) -> bool {
        replace_coord(&mut self.height, value)
    }
}
