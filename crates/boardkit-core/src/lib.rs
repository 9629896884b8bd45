//! # BoardKit Core
//!
//! Core types and utilities shared by the BoardKit crates.
//! Provides object identity, kinds and flags, coordinate units,
//! bounding boxes and the error taxonomy of the operation engine.

pub mod error;
pub mod types;
pub mod units;

pub use error::{Error, ExtObjError, OperationError, Result};

pub use types::{
    BoundingBox, FloaterBboxPolicy, KindMask, ObjectFlags, ObjectId, ObjectKind, Point,
};

pub use units::{format_coord, parse_coord, Coord, MeasurementSystem};
