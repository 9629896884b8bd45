//! Undo and redo replay.
//!
//! Every record is swap-based: applying it restores the saved state and
//! yields the record that restores the state it replaced.

use std::collections::BTreeSet;

use boardkit_core::ObjectId;

use crate::undo::{Removed, UndoOp};

use super::Board;

impl Board {
    /// Undoes the newest undo step. Returns `false` if there is none.
    pub fn undo(&mut self) -> bool {
        let Some((serial, ops)) = self.undo.take_undo_group() else {
            return false;
        };
        let span = tracing::debug_span!("undo", serial, records = ops.len(), board = %self.id());
        let _enter = span.enter();

        let inverses = self.replay(ops);
        self.undo.finish_undo(serial, inverses);
        true
    }

    /// Redoes the most recently undone step. Returns `false` if there is none.
    pub fn redo(&mut self) -> bool {
        let Some((serial, ops)) = self.undo.take_redo_group() else {
            return false;
        };
        let span = tracing::debug_span!("redo", serial, records = ops.len(), board = %self.id());
        let _enter = span.enter();

        let inverses = self.replay(ops);
        self.undo.finish_redo(serial, inverses);
        true
    }

    /// Applies `ops` in order with recording locked, then regenerates the
    /// linked composites they touched.
    pub(crate) fn replay(&mut self, ops: Vec<UndoOp>) -> Vec<UndoOp> {
        let _lock = self.undo.lock();
        let mut touched = BTreeSet::new();
        let mut inverses = Vec::with_capacity(ops.len());
        for op in ops {
            if let Some(inverse) = self.apply_undo_op(op, &mut touched) {
                inverses.push(inverse);
            }
        }
        for sid in touched {
            if self.subcs.contains_key(&sid) {
                self.extobj_regenerate(sid);
            }
        }
        inverses
    }

    /// Composites whose derived geometry may be stale after `id` changed.
    fn note_touched(&self, id: ObjectId, touched: &mut BTreeSet<ObjectId>) {
        if self.subcs.contains_key(&id) {
            touched.insert(id);
        } else if let Some(obj) = self.store.get(id) {
            if let (true, Some(sid)) = (obj.is_floater(), obj.parent.subc()) {
                touched.insert(sid);
            }
        }
    }

    fn apply_undo_op(&mut self, op: UndoOp, touched: &mut BTreeSet<ObjectId>) -> Option<UndoOp> {
        match op {
            UndoOp::Modify { before } => {
                let id = before.id;
                self.detach_object(id);
                let current = self.store.get_mut(id)?;
                let mut restored = *before;
                restored.editing = false;
                let previous = std::mem::replace(current, restored);
                self.attach_object(id);
                if let Some(sid) = previous.parent.subc() {
                    self.subc_part_changed(sid);
                }
                self.note_touched(id, touched);
                Some(UndoOp::Modify {
                    before: Box::new(previous),
                })
            }
            UndoOp::Flags { id, before } => {
                let previous = self.replace_flags(id, before)?;
                Some(UndoOp::Flags {
                    id,
                    before: previous,
                })
            }
            UndoOp::Create { id } => {
                if self.subcs.contains_key(&id) {
                    self.extobj_before_destroy(id);
                    let (snapshot, slot) = self.take_subc(id)?;
                    return Some(UndoOp::Remove {
                        removed: Removed::Subc {
                            snapshot: Box::new(snapshot),
                            slot,
                        },
                    });
                }
                self.note_touched(id, touched);
                let (object, slot) = self.take_object(id)?;
                Some(UndoOp::Remove {
                    removed: Removed::Object {
                        object: Box::new(object),
                        slot,
                    },
                })
            }
            UndoOp::Remove { removed } => match removed {
                Removed::Object { object, slot } => {
                    let id = object.id;
                    if let Err(err) = self.insert_object(*object, Some(slot)) {
                        tracing::warn!(object = %id, error = %err, "cannot restore object");
                        return None;
                    }
                    self.note_touched(id, touched);
                    Some(UndoOp::Create { id })
                }
                Removed::Subc { snapshot, slot } => {
                    let id = self.restore_subc(*snapshot, slot);
                    touched.insert(id);
                    Some(UndoOp::Create { id })
                }
            },
            UndoOp::Subc { before } => {
                let id = before.id();
                let current = self.replace_subc(*before)?;
                touched.insert(id);
                Some(UndoOp::Subc {
                    before: Box::new(current),
                })
            }
            UndoOp::SubcAttr { id, key, before } => {
                let current = self.swap_subc_attribute(id, &key, before.clone())?;
                self.extobj_attr_changed(id, &key, before.as_deref());
                Some(UndoOp::SubcAttr {
                    id,
                    key,
                    before: current,
                })
            }
        }
    }
}
