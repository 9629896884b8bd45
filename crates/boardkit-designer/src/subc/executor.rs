//! Applies an operation table to every child of a composite.

use boardkit_core::{BoundingBox, ObjectId, ObjectKind};

use crate::board::Board;
use crate::ops::{dispatch, OpCtx, OpTable, Target};

/// How child edits of a composite walk are grouped in the undo log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndoMode {
    /// Children record and advance the serial as they would on their own.
    #[default]
    Normal,
    /// One serial shared by every child record.
    Batch,
    /// Nothing below is recorded; the caller records the whole composite.
    PerSubc,
}

impl Board {
    /// Runs `table` over the children of composite `sid`: layer objects layer
    /// by layer in line, arc, text, polygon, graphic order, then padstacks.
    ///
    /// The composite is out of the board index for the duration of the walk,
    /// and its boxes are rebuilt from the children that are still alive
    /// afterwards. Returns `None` if the composite does not exist or a hook
    /// removed it during the walk.
    pub fn run_on_composite(
        &mut self,
        sid: ObjectId,
        table: &OpTable,
        ctx: &OpCtx,
        mode: UndoMode,
    ) -> Option<ObjectId> {
        if !self.subcs.contains_key(&sid) {
            return None;
        }
        let span = tracing::debug_span!(
            "run_on_composite",
            table = table.name,
            subc = %sid,
            board = %self.id(),
            ?mode
        );
        let _enter = span.enter();

        // Dropped in reverse order: record creation resumes before the serial.
        let _serial_guard = match mode {
            UndoMode::Normal => None,
            UndoMode::Batch => {
                self.undo.inc_serial();
                Some(self.undo.freeze_serial())
            }
            UndoMode::PerSubc => Some(self.undo.freeze_serial()),
        };
        let _add_guard = (mode == UndoMode::PerSubc).then(|| self.undo.freeze_add());

        self.detach_subc(sid);
        let children = match self.subcs.get_mut(&sid) {
            Some(subc) => {
                subc.bbox_defer += 1;
                subc.bbox = BoundingBox::inverted();
                subc.bbox_naked = BoundingBox::inverted();
                subc.data.object_ids()
            }
            None => return None,
        };

        for (kind, id) in children {
            if kind == ObjectKind::RatLine {
                continue;
            }
            // Hooks may have replaced or freed children since the snapshot.
            let ours = self
                .store
                .get(id)
                .is_some_and(|o| o.parent.subc() == Some(sid));
            if !ours {
                tracing::trace!(child = %id, "child vanished during walk");
                continue;
            }
            dispatch(self, table, ctx, &Target::object(kind, id));
        }

        let policy = self.options.floater_bbox;
        let Some(subc) = self.subcs.get_mut(&sid) else {
            tracing::debug!(subc = %sid, "composite removed during walk");
            return None;
        };
        subc.bbox_defer = subc.bbox_defer.saturating_sub(1);
        subc.recompute_bbox(&self.store, policy);
        subc.bbox_dirty = false;
        self.attach_subc(sid);
        Some(sid)
    }
}
