//! Geometry of the primitive object kinds.
//!
//! Each primitive implements [`Geometry`]; [`Primitive`] wraps them so the
//! document can store every kind in one arena.

use boardkit_core::{BoundingBox, Coord, ObjectKind, Point};
use serde::{Deserialize, Serialize};

mod arc;
mod gfx;
mod line;
mod polygon;
mod pstk;
mod rat;
mod text;

pub use arc::Arc;
pub use gfx::Graphic;
pub use line::Line;
pub use polygon::Polygon;
pub use pstk::PadStack;
pub use rat::RatLine;
pub use text::Text;

/// Transforms and bounding box shared by every primitive.
pub trait Geometry {
    fn bbox(&self) -> BoundingBox;
    fn translate(&mut self, dx: Coord, dy: Coord);
    fn rotate90(&mut self, center: Point, steps: u8);
    fn rotate(&mut self, center: Point, cos_a: f64, sin_a: f64, angle_deg: f64);

    /// The kind's "size" property (stroke thickness, text scale, pad diameter).
    fn size(&self) -> Option<Coord> {
        None
    }

    /// Returns `false` when the kind has no size or the value is unchanged.
    fn set_size(&mut self, _value: Coord) -> bool {
        false
    }

    fn clearance(&self) -> Option<Coord> {
        None
    }

    fn set_clearance(&mut self, _value: Coord) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Line(Line),
    Arc(Arc),
    Text(Text),
    Polygon(Polygon),
    Graphic(Graphic),
    Rat(RatLine),
    PadStack(PadStack),
}

impl Primitive {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Primitive::Line(_) => ObjectKind::Line,
            Primitive::Arc(_) => ObjectKind::Arc,
            Primitive::Text(_) => ObjectKind::Text,
            Primitive::Polygon(_) => ObjectKind::Polygon,
            Primitive::Graphic(_) => ObjectKind::Graphic,
            Primitive::Rat(_) => ObjectKind::RatLine,
            Primitive::PadStack(_) => ObjectKind::PadStack,
        }
    }

    fn inner(&self) -> &dyn Geometry {
        match self {
            Primitive::Line(g) => g,
            Primitive::Arc(g) => g,
            Primitive::Text(g) => g,
            Primitive::Polygon(g) => g,
            Primitive::Graphic(g) => g,
            Primitive::Rat(g) => g,
            Primitive::PadStack(g) => g,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Geometry {
        match self {
            Primitive::Line(g) => g,
            Primitive::Arc(g) => g,
            Primitive::Text(g) => g,
            Primitive::Polygon(g) => g,
            Primitive::Graphic(g) => g,
            Primitive::Rat(g) => g,
            Primitive::PadStack(g) => g,
        }
    }

    /// Vertex `index` of a line, polygon or arc.
    pub fn point(&self, index: usize) -> Option<Point> {
        match self {
            Primitive::Line(l) => match index {
                0 => Some(l.p1),
                1 => Some(l.p2),
                _ => None,
            },
            Primitive::Polygon(p) => p.points.get(index).copied(),
            Primitive::Arc(a) => (index < 2).then(|| a.endpoint(index)),
            _ => None,
        }
    }

    /// Moves a single vertex. Returns `false` if the vertex does not exist.
    pub fn move_point(&mut self, index: usize, dx: Coord, dy: Coord) -> bool {
        match self {
            Primitive::Line(l) => match index {
                0 => l.p1 = l.p1.translated(dx, dy),
                1 => l.p2 = l.p2.translated(dx, dy),
                _ => return false,
            },
            Primitive::Polygon(p) => match p.points.get_mut(index) {
                Some(pt) => *pt = pt.translated(dx, dy),
                None => return false,
            },
            Primitive::Arc(a) => return a.move_endpoint(index, dx, dy),
            _ => return false,
        }
        true
    }

    pub fn as_line(&self) -> Option<&Line> {
        match self {
            Primitive::Line(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match self {
            Primitive::Polygon(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_polygon_mut(&mut self) -> Option<&mut Polygon> {
        match self {
            Primitive::Polygon(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_padstack(&self) -> Option<&PadStack> {
        match self {
            Primitive::PadStack(p) => Some(p),
            _ => None,
        }
    }
}

impl Geometry for Primitive {
    fn bbox(&self) -> BoundingBox {
        self.inner().bbox()
    }

    fn translate(&mut self, dx: Coord, dy: Coord) {
        self.inner_mut().translate(dx, dy)
    }

    fn rotate90(&mut self, center: Point, steps: u8) {
        self.inner_mut().rotate90(center, steps)
    }

    fn rotate(&mut self, center: Point, cos_a: f64, sin_a: f64, angle_deg: f64) {
        self.inner_mut().rotate(center, cos_a, sin_a, angle_deg)
    }

    fn size(&self) -> Option<Coord> {
        self.inner().size()
    }

    fn set_size(&mut self, value: Coord) -> bool {
        self.inner_mut().set_size(value)
    }

    fn clearance(&self) -> Option<Coord> {
        self.inner().clearance()
    }

    fn set_clearance(&mut self, value: Coord) -> bool {
        self.inner_mut().set_clearance(value)
    }
}

/// Shared setter body: clamps at zero and reports whether anything changed.
pub(crate) fn replace_coord(slot: &mut Coord, value: Coord) -> bool {
    let value = value.max(0);
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
