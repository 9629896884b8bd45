//! Building operations from host parameters.

use boardkit_core::{Coord, KindMask, ObjectFlags, OperationError, Point, Result};
use serde::{Deserialize, Serialize};

use crate::board::Board;

use super::tables::lookup_table;
use super::walk::{apply_to_selected, SelectFlags};
use super::{apply_single, FlagChange, OpCtx, OpKind, OpTable, Target};

/// Already-validated parameters of an operation, as a host would pass them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpParams {
    pub dx: Option<Coord>,
    pub dy: Option<Coord>,
    pub center_x: Option<Coord>,
    pub center_y: Option<Coord>,
    pub steps: Option<u8>,
    /// Degrees, counter-clockwise.
    pub angle: Option<f64>,
    pub value: Option<Coord>,
    pub absolute: bool,
    pub flags: Option<ObjectFlags>,
    pub how: Option<FlagChange>,
    pub restore: bool,
}

impl OpParams {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            OperationError::InvalidParameter {
                param: "params".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// A table paired with a context it accepts.
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    pub table: &'static OpTable,
    pub ctx: OpCtx,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        self.table.name
    }
}

/// What an operation is applied to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selector {
    Single(Target),
    Selected {
        kinds: KindMask,
        flags: SelectFlags,
        reset: bool,
    },
}

/// Looks up the table `name` and builds its context from `params`.
pub fn begin_operation(name: &str, params: &OpParams) -> Result<Operation> {
    let table = lookup_table(name).ok_or_else(|| OperationError::UnknownTable {
        name: name.to_string(),
    })?;
    let need = |param: &str| -> OperationError {
        OperationError::MissingParameter {
            table: table.name.to_string(),
            param: param.to_string(),
        }
    };
    let center = || -> Result<Point> {
        Ok(Point::new(
            params.center_x.ok_or_else(|| need("center_x"))?,
            params.center_y.ok_or_else(|| need("center_y"))?,
        ))
    };

    let ctx = match table.op {
        OpKind::Move => OpCtx::Move {
            dx: params.dx.unwrap_or(0),
            dy: params.dy.unwrap_or(0),
        },
        OpKind::Copy => OpCtx::Copy {
            dx: params.dx.unwrap_or(0),
            dy: params.dy.unwrap_or(0),
        },
        OpKind::Rotate90 => OpCtx::Rotate90 {
            center: center()?,
            steps: params.steps.ok_or_else(|| need("steps"))? % 4,
        },
        OpKind::Rotate => {
            let angle = params.angle.ok_or_else(|| need("angle"))?;
            if !angle.is_finite() {
                return Err(OperationError::InvalidParameter {
                    param: "angle".to_string(),
                    reason: format!("{angle} is not a finite number"),
                }
                .into());
            }
            OpCtx::rotate(center()?, angle)
        }
        OpKind::ChangeSize => OpCtx::ChangeSize {
            value: params.value.ok_or_else(|| need("value"))?,
            absolute: params.absolute,
        },
        OpKind::ChangeClearance => OpCtx::ChangeClearance {
            value: params.value.ok_or_else(|| need("value"))?,
            absolute: params.absolute,
        },
        OpKind::ChangeFlag => OpCtx::ChangeFlag {
            flags: params.flags.ok_or_else(|| need("flags"))?,
            how: params.how.unwrap_or(FlagChange::Toggle),
        },
        OpKind::Clip => OpCtx::Clip {
            restore: params.restore,
        },
        OpKind::Remove => OpCtx::Remove,
    };
    Ok(Operation { table, ctx })
}

/// Runs `op` on the selected targets and closes the undo step if anything
/// changed.
pub fn apply(board: &mut Board, op: &Operation, selector: Selector) -> Result<bool> {
    let span = tracing::debug_span!("apply", table = op.name(), board = %board.id());
    let _enter = span.enter();

    let changed = match selector {
        Selector::Single(target) => {
            if !board.contains(target.id) {
                return Err(OperationError::ObjectNotFound { id: target.id.0 }.into());
            }
            apply_single(board, op.table, &op.ctx, &target)?.is_some()
        }
        Selector::Selected {
            kinds,
            flags,
            reset,
        } => apply_to_selected(board, op.table, &op.ctx, reset, kinds, flags)?,
    };
    if changed {
        board.undo.inc_serial();
    }
    Ok(changed)
}
