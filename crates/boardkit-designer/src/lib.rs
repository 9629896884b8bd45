//! # BoardKit Designer
//!
//! The board document and the object-operation engine of a PCB layout
//! editor. Every geometric transform, attribute change and removal is routed
//! through a per-kind dispatch table, descends into composites (subcircuits)
//! with their spatial index and bounding boxes kept consistent, and
//! cooperates with extended objects: composites whose derived geometry is
//! regenerated from a few editable floaters.
//!
//! ## Core Components
//!
//! - **Board**: object arena, composites, layers, spatial index
//! - **Operations**: dispatch tables for move, copy, rotate, resize,
//!   clearance, flags, clip and remove
//! - **Composite executor**: runs a table over a composite's children
//! - **Extended objects**: registry, hook protocol and `line-of-vias`
//! - **Undo log**: serial-grouped, swap-based records
//!
//! ## Architecture
//!
//! ```text
//! Board
//!   ├── ObjectStore (primitives by id)
//!   ├── Data (layers, padstacks, rats, composites, SpatialIndex)
//!   ├── Subc (composites, each with its own Data)
//!   ├── ExtObjRegistry (extended objects by name)
//!   └── UndoLog
//!
//! OpTable ──dispatch──> handlers ──> Board
//!   └── run_on_composite (composite children)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use boardkit_designer::{ops, Board, Line};
//!
//! let mut board = Board::new();
//! let top = board.add_layer("top");
//! let id = board.add_line(top, Line::new(a, b, 250_000))?;
//! board.select(id, false);
//!
//! let op = ops::begin_operation("move", &params)?;
//! ops::apply(&mut board, &op, selector)?;
//! ```

pub mod board;
pub mod extobj;
pub mod model;
pub mod object_store;
pub mod ops;
pub mod selection;
pub mod spatial_index;
pub mod subc;
pub mod undo;

pub use board::{Board, BoardOptions, Data, DataOwner, Layer, Parent};
pub use extobj::{
    EditToken, ExtObjHandle, ExtObjRegistry, ExtObject, FloatDel, FloatNew, HookSet, LineOfVias,
};
pub use model::{Arc, Geometry, Graphic, Line, PadStack, Polygon, Primitive, RatLine, Text};
pub use object_store::{Object, ObjectStore};
pub use ops::{
    apply, apply_single, apply_to_selected, begin_operation, lookup_table, FlagChange, OpCtx,
    OpKind, OpParams, OpTable, Operation, SelectFlags, Selector, Target,
};
pub use selection::SelectionManager;
pub use spatial_index::SpatialIndex;
pub use subc::{Subc, SubcSnapshot, UndoMode};
pub use undo::{UndoLog, UndoOp};

pub use boardkit_core::{
    BoundingBox, Coord, Error, ExtObjError, KindMask, ObjectFlags, ObjectId, ObjectKind,
    OperationError, Point, Result,
};
