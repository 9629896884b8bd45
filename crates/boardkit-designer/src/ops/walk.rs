//! The "all selected objects" walk.

use bitflags::bitflags;
use boardkit_core::{KindMask, ObjectFlags, ObjectId, ObjectKind, Result};

use crate::board::Board;
use crate::undo::UndoOp;

use super::{dispatch, OpCtx, OpTable, Target};

bitflags! {
    /// Modifiers of [`apply_to_selected`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SelectFlags: u8 {
        /// Locked objects are operated on too.
        const INCLUDE_LOCKED = 1 << 0;
        /// Do not descend into composites.
        const EXCLUDE_SUBC_PARTS = 1 << 1;
    }
}

struct Walk<'a> {
    table: &'a OpTable,
    ctx: &'a OpCtx,
    reset: bool,
    kinds: KindMask,
    flags: SelectFlags,
    changed: bool,
}

impl Walk<'_> {
    /// Clears the selection flag of `id`, recording the old flags.
    fn reset_selection(&mut self, board: &mut Board, id: ObjectId) {
        let Some(before) = board.flags_of(id) else {
            return;
        };
        board.undo.record(UndoOp::Flags { id, before });
        board.replace_flags(id, before - ObjectFlags::SELECTED);
        self.changed = true;
    }

    fn visit(&mut self, board: &mut Board, kind: ObjectKind, id: ObjectId) {
        if self.reset {
            self.reset_selection(board, id);
        }
        if dispatch(board, self.table, self.ctx, &Target::object(kind, id)).is_some() {
            self.changed = true;
        }
    }

    /// Whether a primitive passes the kind, selection, lock and visibility
    /// filters.
    fn wants(&self, board: &Board, kind: ObjectKind, id: ObjectId, locked_ok: bool) -> bool {
        if !self.kinds.has(kind) || self.table.entry(kind).is_none() {
            return false;
        }
        let Some(obj) = board.object(id) else {
            return false;
        };
        obj.is_selected()
            && (locked_ok || !obj.is_locked() || self.flags.contains(SelectFlags::INCLUDE_LOCKED))
            && board.is_layer_visible(obj.parent)
    }

    fn walk_board(&mut self, board: &mut Board) {
        for (kind, id) in board.root().object_ids() {
            if self.wants(board, kind, id, false) {
                self.visit(board, kind, id);
            }
        }
    }

    fn walk_subc(&mut self, board: &mut Board, sid: ObjectId) {
        let Some(subc) = board.subc(sid) else {
            return;
        };
        let subc_locked = subc.is_locked();
        let handled = self.kinds.has(ObjectKind::Composite)
            && self.table.subc.is_some()
            && subc.is_selected()
            && (!subc_locked || self.flags.contains(SelectFlags::INCLUDE_LOCKED));

        if handled {
            self.visit(board, ObjectKind::Composite, sid);
        }
        if self.flags.contains(SelectFlags::EXCLUDE_SUBC_PARTS) {
            return;
        }

        let Some(subc) = board.subc(sid) else {
            return;
        };
        for (kind, id) in subc.data.object_ids() {
            let Some(obj) = board.object(id) else {
                continue;
            };
            if obj.parent.subc() != Some(sid) || !obj.is_selected() {
                continue;
            }
            let floater = obj.is_floater();
            if handled {
                // Floaters stay individually editable unless the composite
                // entry already reached them; the lock does not apply.
                if floater
                    && !self.table.subc_walks_parts
                    && self.wants(board, kind, id, true)
                {
                    self.visit(board, kind, id);
                } else if self.reset {
                    self.reset_selection(board, id);
                }
                continue;
            }
            // A locked composite keeps its interior, floaters excepted.
            let locked_ok = floater;
            if subc_locked && !locked_ok && !self.flags.contains(SelectFlags::INCLUDE_LOCKED) {
                continue;
            }
            if self.wants(board, kind, id, locked_ok) {
                self.visit(board, kind, id);
            }
        }
    }
}

/// Applies `table` to every selected object matching `kinds`.
///
/// Board-level objects are visited first in layer and kind order, then every
/// composite: a selected composite is dispatched as a whole and its parts
/// are not visited again, except for selected floaters when the composite
/// handler does not walk its children; otherwise its selected parts are
/// dispatched one by one. With `reset`, each visited object's selection is cleared (and
/// recorded) and the serial is advanced once at the end if anything changed.
pub fn apply_to_selected(
    board: &mut Board,
    table: &OpTable,
    ctx: &OpCtx,
    reset: bool,
    kinds: KindMask,
    flags: SelectFlags,
) -> Result<bool> {
    table.check(ctx)?;
    let span = tracing::debug_span!("apply_to_selected", table = table.name, board = %board.id());
    let _enter = span.enter();

    let mut walk = Walk {
        table,
        ctx,
        reset,
        kinds,
        flags,
        changed: false,
    };
    walk.walk_board(board);
    for sid in board.subc_ids().to_vec() {
        walk.walk_subc(board, sid);
    }

    if walk.changed && reset {
        board.undo.inc_serial();
    }
    tracing::debug!(changed = walk.changed, "selected walk done");
    Ok(walk.changed)
}
