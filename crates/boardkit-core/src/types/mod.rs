//! Object identity, kinds and flags.

mod bbox;

pub use bbox::{BoundingBox, Point};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identity of a board object.
///
/// Ids are assigned monotonically by the document and never reused while it
/// is open, so a stale id simply fails to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of object kinds the operation tables dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Line,
    Arc,
    Text,
    Polygon,
    LinePoint,
    PolygonPoint,
    ArcEndpoint,
    Graphic,
    RatLine,
    PadStack,
    Composite,
}

impl ObjectKind {
    /// All kinds, in dispatch-table order.
    pub const ALL: [ObjectKind; 11] = [
        ObjectKind::Line,
        ObjectKind::Arc,
        ObjectKind::Text,
        ObjectKind::Polygon,
        ObjectKind::LinePoint,
        ObjectKind::PolygonPoint,
        ObjectKind::ArcEndpoint,
        ObjectKind::Graphic,
        ObjectKind::RatLine,
        ObjectKind::PadStack,
        ObjectKind::Composite,
    ];

    /// The kinds that live on a layer, in the order composite children are walked.
    pub const LAYER_KINDS: [ObjectKind; 5] = [
        ObjectKind::Line,
        ObjectKind::Arc,
        ObjectKind::Text,
        ObjectKind::Polygon,
        ObjectKind::Graphic,
    ];

    /// The mask bit for this kind.
    pub fn mask(self) -> KindMask {
        match self {
            ObjectKind::Line => KindMask::LINE,
            ObjectKind::Arc => KindMask::ARC,
            ObjectKind::Text => KindMask::TEXT,
            ObjectKind::Polygon => KindMask::POLYGON,
            ObjectKind::LinePoint => KindMask::LINE_POINT,
            ObjectKind::PolygonPoint => KindMask::POLYGON_POINT,
            ObjectKind::ArcEndpoint => KindMask::ARC_ENDPOINT,
            ObjectKind::Graphic => KindMask::GRAPHIC,
            ObjectKind::RatLine => KindMask::RAT_LINE,
            ObjectKind::PadStack => KindMask::PAD_STACK,
            ObjectKind::Composite => KindMask::COMPOSITE,
        }
    }

    /// Point kinds address a vertex of a parent object rather than an object.
    pub fn is_point(self) -> bool {
        matches!(
            self,
            ObjectKind::LinePoint | ObjectKind::PolygonPoint | ObjectKind::ArcEndpoint
        )
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Line => "line",
            ObjectKind::Arc => "arc",
            ObjectKind::Text => "text",
            ObjectKind::Polygon => "polygon",
            ObjectKind::LinePoint => "line-point",
            ObjectKind::PolygonPoint => "polygon-point",
            ObjectKind::ArcEndpoint => "arc-endpoint",
            ObjectKind::Graphic => "graphic",
            ObjectKind::RatLine => "rat-line",
            ObjectKind::PadStack => "padstack",
            ObjectKind::Composite => "subcircuit",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Set of object kinds, used to filter selected-object walks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct KindMask: u32 {
        const LINE = 1 << 0;
        const ARC = 1 << 1;
        const TEXT = 1 << 2;
        const POLYGON = 1 << 3;
        const LINE_POINT = 1 << 4;
        const POLYGON_POINT = 1 << 5;
        const ARC_ENDPOINT = 1 << 6;
        const GRAPHIC = 1 << 7;
        const RAT_LINE = 1 << 8;
        const PAD_STACK = 1 << 9;
        const COMPOSITE = 1 << 10;

        /// Everything a selection walk can reach.
        const SELECTABLE = Self::LINE.bits()
            | Self::ARC.bits()
            | Self::TEXT.bits()
            | Self::POLYGON.bits()
            | Self::GRAPHIC.bits()
            | Self::RAT_LINE.bits()
            | Self::PAD_STACK.bits()
            | Self::COMPOSITE.bits();
    }
}

impl KindMask {
    /// Whether `kind` is in the mask.
    pub fn has(self, kind: ObjectKind) -> bool {
        self.contains(kind.mask())
    }
}

bitflags! {
    /// Per-object state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ObjectFlags: u32 {
        const SELECTED = 1 << 0;
        const LOCK = 1 << 1;
        /// Independently editable part of a composite.
        const FLOATER = 1 << 2;
        const CLEARLINE = 1 << 3;
        const FOUND = 1 << 4;
        const WARN = 1 << 5;
    }
}

/// How floater children contribute to a composite's bounding boxes.
///
/// The naked box never includes floaters. This switch only decides whether
/// the full box does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloaterBboxPolicy {
    /// Floaters contribute to neither box.
    #[default]
    Exclude,
    /// Floaters contribute to the full box only.
    IncludeInFull,
}

impl fmt::Display for FloaterBboxPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exclude => write!(f, "exclude"),
            Self::IncludeInFull => write!(f, "include_in_full"),
        }
    }
}
