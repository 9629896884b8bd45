//! Object-operation dispatch.
//!
//! An [`OpTable`] maps every [`ObjectKind`] to an optional handler for one
//! transform. A missing handler, or a handler returning `None`, means "no-op
//! for this object"; the only hard failure is a context built for another
//! transform, which is rejected before anything is touched.
//!
//! Entry points:
//! - [`apply_single`] routes one object through a table.
//! - [`apply_to_selected`] walks every selected object, descending into
//!   composites.
//! - [`begin_operation`] / [`apply`] build and run an operation from
//!   host-supplied parameters.

mod params;
pub mod tables;
mod walk;

pub use params::{apply, begin_operation, OpParams, Operation, Selector};
pub use tables::lookup_table;
pub use walk::{apply_to_selected, SelectFlags};

use std::fmt;

use boardkit_core::{Coord, ObjectFlags, ObjectId, ObjectKind, OperationError, Point, Result};
use serde::{Deserialize, Serialize};

use crate::board::Board;

/// The transform an [`OpTable`] implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Move,
    Copy,
    Rotate90,
    Rotate,
    ChangeSize,
    ChangeClearance,
    ChangeFlag,
    Clip,
    Remove,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::Move => "move",
            OpKind::Copy => "copy",
            OpKind::Rotate90 => "rotate90",
            OpKind::Rotate => "rotate",
            OpKind::ChangeSize => "change_size",
            OpKind::ChangeClearance => "change_clearance",
            OpKind::ChangeFlag => "change_flag",
            OpKind::Clip => "clip",
            OpKind::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// How a flag mask is combined with an object's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagChange {
    Set,
    Clear,
    Toggle,
}

impl FlagChange {
    pub fn apply(self, current: ObjectFlags, mask: ObjectFlags) -> ObjectFlags {
        match self {
            FlagChange::Set => current | mask,
            FlagChange::Clear => current - mask,
            FlagChange::Toggle => current ^ mask,
        }
    }
}

/// Parameters of exactly one transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCtx {
    Move { dx: Coord, dy: Coord },
    Copy { dx: Coord, dy: Coord },
    Rotate90 { center: Point, steps: u8 },
    Rotate { center: Point, angle: f64, cos: f64, sin: f64 },
    ChangeSize { value: Coord, absolute: bool },
    ChangeClearance { value: Coord, absolute: bool },
    ChangeFlag { flags: ObjectFlags, how: FlagChange },
    Clip { restore: bool },
    Remove,
}

impl OpCtx {
    /// Rotation by `angle` degrees, counter-clockwise.
    pub fn rotate(center: Point, angle: f64) -> Self {
        let rad = angle.to_radians();
        OpCtx::Rotate {
            center,
            angle,
            cos: rad.cos(),
            sin: rad.sin(),
        }
    }

    pub fn kind(&self) -> OpKind {
        match self {
            OpCtx::Move { .. } => OpKind::Move,
            OpCtx::Copy { .. } => OpKind::Copy,
            OpCtx::Rotate90 { .. } => OpKind::Rotate90,
            OpCtx::Rotate { .. } => OpKind::Rotate,
            OpCtx::ChangeSize { .. } => OpKind::ChangeSize,
            OpCtx::ChangeClearance { .. } => OpKind::ChangeClearance,
            OpCtx::ChangeFlag { .. } => OpKind::ChangeFlag,
            OpCtx::Clip { .. } => OpKind::Clip,
            OpCtx::Remove => OpKind::Remove,
        }
    }
}

/// The object an operation is applied to.
///
/// For point kinds `id` is the owning line, polygon or arc and `point` the
/// vertex index. The parent container is resolved from the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub kind: ObjectKind,
    pub id: ObjectId,
    #[serde(default)]
    pub point: Option<usize>,
}

impl Target {
    pub fn object(kind: ObjectKind, id: ObjectId) -> Self {
        Self {
            kind,
            id,
            point: None,
        }
    }

    pub fn point(kind: ObjectKind, id: ObjectId, index: usize) -> Self {
        Self {
            kind,
            id,
            point: Some(index),
        }
    }

    pub fn subc(id: ObjectId) -> Self {
        Self::object(ObjectKind::Composite, id)
    }

    /// The kind of the object `id` refers to.
    fn object_kind(&self) -> ObjectKind {
        match self.kind {
            ObjectKind::LinePoint => ObjectKind::Line,
            ObjectKind::PolygonPoint => ObjectKind::Polygon,
            ObjectKind::ArcEndpoint => ObjectKind::Arc,
            kind => kind,
        }
    }
}

/// Per-kind handler. `None` means nothing was done; otherwise the id of the
/// resulting object, which differs from the target for copies.
pub type OpFn = fn(&mut Board, &OpCtx, &Target) -> Option<ObjectId>;

/// Verdict of a table's `before` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookFlow {
    Continue,
    Skip,
}

pub type BeforeFn = fn(&mut Board, &OpCtx, &Target) -> HookFlow;
pub type AfterFn = fn(&mut Board, &OpCtx, &Target);

/// Dispatch table of one transform.
#[derive(Debug, Clone, Copy)]
pub struct OpTable {
    pub name: &'static str,
    pub op: OpKind,
    pub line: Option<OpFn>,
    pub arc: Option<OpFn>,
    pub text: Option<OpFn>,
    pub polygon: Option<OpFn>,
    pub line_point: Option<OpFn>,
    pub polygon_point: Option<OpFn>,
    pub arc_endpoint: Option<OpFn>,
    pub graphic: Option<OpFn>,
    pub rat: Option<OpFn>,
    pub padstack: Option<OpFn>,
    pub subc: Option<OpFn>,
    pub before: Option<BeforeFn>,
    pub after: Option<AfterFn>,
    /// Bypass extended-object pre/post edit hooks.
    pub suppress_extobj_regen: bool,
    /// The composite handler runs the table over every child itself.
    pub subc_walks_parts: bool,
}

impl OpTable {
    /// A table with no handlers.
    pub const fn new(name: &'static str, op: OpKind) -> Self {
        Self {
            name,
            op,
            line: None,
            arc: None,
            text: None,
            polygon: None,
            line_point: None,
            polygon_point: None,
            arc_endpoint: None,
            graphic: None,
            rat: None,
            padstack: None,
            subc: None,
            before: None,
            after: None,
            suppress_extobj_regen: false,
            subc_walks_parts: false,
        }
    }

    pub fn entry(&self, kind: ObjectKind) -> Option<OpFn> {
        match kind {
            ObjectKind::Line => self.line,
            ObjectKind::Arc => self.arc,
            ObjectKind::Text => self.text,
            ObjectKind::Polygon => self.polygon,
            ObjectKind::LinePoint => self.line_point,
            ObjectKind::PolygonPoint => self.polygon_point,
            ObjectKind::ArcEndpoint => self.arc_endpoint,
            ObjectKind::Graphic => self.graphic,
            ObjectKind::RatLine => self.rat,
            ObjectKind::PadStack => self.padstack,
            ObjectKind::Composite => self.subc,
        }
    }

    /// Rejects a context built for another transform.
    pub fn check(&self, ctx: &OpCtx) -> Result<()> {
        if ctx.kind() == self.op {
            return Ok(());
        }
        Err(OperationError::InvalidContext {
            table: self.name.to_string(),
            expected: format!("{:?}", self.op),
            actual: format!("{:?}", ctx.kind()),
        }
        .into())
    }
}

/// Routes one object through `table`.
///
/// Fails only with `InvalidContext`, before any side effect.
pub fn apply_single(
    board: &mut Board,
    table: &OpTable,
    ctx: &OpCtx,
    target: &Target,
) -> Result<Option<ObjectId>> {
    table.check(ctx)?;
    Ok(dispatch(board, table, ctx, target))
}

pub(crate) fn dispatch(
    board: &mut Board,
    table: &OpTable,
    ctx: &OpCtx,
    target: &Target,
) -> Option<ObjectId> {
    if board.kind_of(target.id) != Some(target.object_kind()) {
        tracing::debug!(table = table.name, target = %target.id, kind = %target.kind, "target does not resolve");
        return None;
    }

    if let Some(before) = table.before {
        if before(board, ctx, target) == HookFlow::Skip {
            tracing::debug!(table = table.name, target = %target.id, "skipped by before hook");
            return None;
        }
    }

    let token = if table.suppress_extobj_regen || target.kind == ObjectKind::Composite {
        None
    } else {
        board.extobj_pre_edit(target.id)
    };

    let result = table
        .entry(target.kind)
        .and_then(|handler| handler(board, ctx, target));

    if let Some(token) = token {
        board.extobj_post_edit(token, result.or(Some(target.id)));
    }

    if let Some(after) = table.after {
        after(board, ctx, target);
    }

    result
}
