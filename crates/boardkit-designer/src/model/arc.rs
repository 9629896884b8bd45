use boardkit_core::{BoundingBox, Coord, Point};
use serde::{Deserialize, Serialize};

use super::{replace_coord, Geometry};

/// A circular arc trace. Angles are in degrees, counter-clockwise from +x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point,
    pub radius: Coord,
    pub start_angle: f64,
    pub delta_angle: f64,
    pub thickness: Coord,
    #[serde(default)]
    pub clearance: Coord,
}

impl Arc {
    pub fn new(center: Point, radius: Coord, start_angle: f64, delta_angle: f64, thickness: Coord) -> Self {
        Self {
            center,
            radius,
            start_angle,
            delta_angle,
            thickness,
            clearance: 0,
        }
    }

    fn point_at(&self, angle_deg: f64) -> Point {
        let a = angle_deg.to_radians();
        Point::new(
            self.center.x + (self.radius as f64 * a.cos()).round() as Coord,
            self.center.y + (self.radius as f64 * a.sin()).round() as Coord,
        )
    }

    /// Endpoint 0 is at the start angle, endpoint 1 at the end of the sweep.
    pub fn endpoint(&self, index: usize) -> Point {
        if index == 0 {
            self.point_at(self.start_angle)
        } else {
            self.point_at(self.start_angle + self.delta_angle)
        }
    }

    /// Moves one endpoint along the circle towards the displaced position.
    pub fn move_endpoint(&mut self, index: usize, dx: Coord, dy: Coord) -> bool {
        if index > 1 {
            return false;
        }
        let target = self.endpoint(index).translated(dx, dy);
        let angle = ((target.y - self.center.y) as f64)
            .atan2((target.x - self.center.x) as f64)
            .to_degrees();
        if index == 0 {
            let end = self.start_angle + self.delta_angle;
            self.start_angle = normalize_angle(angle);
            self.delta_angle = end - self.start_angle;
        } else {
            self.delta_angle = angle - self.start_angle;
        }
        self.delta_angle %= 360.0;
        true
    }
}

fn normalize_angle(angle: f64) -> f64 {
    let a = angle % 360.0;
    if a < 0.0 {
        a + 360.0
    } else {
        a
    }
}

impl Geometry for Arc {
    fn bbox(&self) -> BoundingBox {
        let mut bbox = BoundingBox::at(self.endpoint(0));
        bbox.bump_point(self.endpoint(1));

        let (lo, hi) = if self.delta_angle >= 0.0 {
            (self.start_angle, self.start_angle + self.delta_angle)
        } else {
            (self.start_angle + self.delta_angle, self.start_angle)
        };
        // Cardinal extremes crossed by the sweep.
        let mut quadrant = (lo / 90.0).ceil() * 90.0;
        while quadrant <= hi {
            bbox.bump_point(self.point_at(quadrant));
            quadrant += 90.0;
        }
        bbox.bloated(self.thickness / 2)
    }

    fn translate(&mut self, dx: Coord, dy: Coord) {
        self.center = self.center.translated(dx, dy);
    }

    fn rotate90(&mut self, center: Point, steps: u8) {
        self.center = self.center.rotated90(center, steps);
        self.start_angle = normalize_angle(self.start_angle + 90.0 * f64::from(steps % 4));
    }

    fn rotate(&mut self, center: Point, cos_a: f64, sin_a: f64, angle_deg: f64) {
        self.center = self.center.rotated(center, cos_a, sin_a);
        self.start_angle = normalize_angle(self.start_angle + angle_deg);
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
