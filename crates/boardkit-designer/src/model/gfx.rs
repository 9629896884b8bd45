use boardkit_core::{BoundingBox, Coord, Point};
use serde::{Deserialize, Serialize};

use super::Geometry;

/// A placed graphic (logo, bitmap frame) described by its outline only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graphic {
    pub center: Point,
    pub width: Coord,
    pub height: Coord,
    pub rotation: f64,
}

impl Graphic {
    pub fn new(center: Point, width: Coord, height: Coord) -> Self {
        Self {
            center,
            width,
            height,
            rotation: 0.0,
        }
    }
}

impl Geometry for Graphic {
    fn bbox(&self) -> BoundingBox {
        let (hw, hh) = (self.width / 2, self.height / 2);
        let c = self.center;
        let r = self.rotation.to_radians();
        let (cos_a, sin_a) = (r.cos(), r.sin());
        let corners = [
            Point::new(c.x - hw, c.y - hh).rotated(c, cos_a, sin_a),
            Point::new(c.x + hw, c.y - hh).rotated(c, cos_a, sin_a),
            Point::new(c.x + hw, c.y + hh).rotated(c, cos_a, sin_a),
            Point::new(c.x - hw, c.y + hh).rotated(c, cos_a, sin_a),
        ];
        BoundingBox::from_points(&corners).unwrap_or_else(|| BoundingBox::at(c))
    }

    fn translate(&mut self, dx: Coord, dy: Coord) {
        self.center = self.center.translated(dx, dy);
    }

    fn rotate90(&mut self, center: Point, steps: u8) {
        self.center = self.center.rotated90(center, steps);
        self.rotation = (self.rotation + 90.0 * f64::from(steps % 4)) % 360.0;
    }

    fn rotate(&mut self, center: Point, cos_a: f64, sin_a: f64, angle_deg: f64) {
        self.center = self.center.rotated(center, cos_a, sin_a);
        self.rotation = (self.rotation + angle_deg) % 360.0;
    }
}
