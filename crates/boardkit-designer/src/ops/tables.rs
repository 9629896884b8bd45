//! The built-in operation tables and their per-kind handlers.

use boardkit_core::{ObjectFlags, ObjectId, Point};

use crate::board::{Board, Parent};
use crate::extobj::FloatDel;
use crate::model::Geometry;
use crate::object_store::Object;
use crate::subc::UndoMode;
use crate::undo::UndoOp;

use super::{HookFlow, OpCtx, OpKind, OpTable, Target};

pub static MOVE: OpTable = OpTable {
    line: Some(move_object),
    arc: Some(move_object),
    text: Some(move_object),
    polygon: Some(move_object),
    line_point: Some(move_point),
    polygon_point: Some(move_point),
    arc_endpoint: Some(move_point),
    graphic: Some(move_object),
    padstack: Some(move_object),
    subc: Some(move_subc),
    subc_walks_parts: true,
    ..OpTable::new("move", OpKind::Move)
};

pub static COPY: OpTable = OpTable {
    line: Some(copy_object),
    arc: Some(copy_object),
    text: Some(copy_object),
    polygon: Some(copy_object),
    graphic: Some(copy_object),
    rat: Some(copy_object),
    padstack: Some(copy_object),
    subc: Some(copy_subc),
    subc_walks_parts: true,
    ..OpTable::new("copy", OpKind::Copy)
};

pub static ROTATE90: OpTable = OpTable {
    line: Some(rotate90_object),
    arc: Some(rotate90_object),
    text: Some(rotate90_object),
    polygon: Some(rotate90_object),
    graphic: Some(rotate90_object),
    padstack: Some(rotate90_object),
    subc: Some(rotate90_subc),
    subc_walks_parts: true,
    ..OpTable::new("rotate90", OpKind::Rotate90)
};

pub static ROTATE: OpTable = OpTable {
    line: Some(rotate_object),
    arc: Some(rotate_object),
    text: Some(rotate_object),
    polygon: Some(rotate_object),
    graphic: Some(rotate_object),
    padstack: Some(rotate_object),
    subc: Some(rotate_subc),
    subc_walks_parts: true,
    ..OpTable::new("rotate", OpKind::Rotate)
};

pub static CHANGE_SIZE: OpTable = OpTable {
    line: Some(change_size),
    arc: Some(change_size),
    text: Some(change_size),
    padstack: Some(change_size),
    subc: Some(change_size_subc),
    subc_walks_parts: true,
    ..OpTable::new("change_size", OpKind::ChangeSize)
};

pub static CHANGE_CLEARANCE: OpTable = OpTable {
    line: Some(change_clearance),
    arc: Some(change_clearance),
    polygon: Some(change_clearance),
    padstack: Some(change_clearance),
    subc: Some(change_clearance_subc),
    subc_walks_parts: true,
    ..OpTable::new("change_clearance", OpKind::ChangeClearance)
};

pub static CHANGE_FLAG: OpTable = OpTable {
    line: Some(change_flag),
    arc: Some(change_flag),
    text: Some(change_flag),
    polygon: Some(change_flag),
    graphic: Some(change_flag),
    rat: Some(change_flag),
    padstack: Some(change_flag),
    subc: Some(change_flag),
    suppress_extobj_regen: true,
    ..OpTable::new("change_flag", OpKind::ChangeFlag)
};

pub static CLIP: OpTable = OpTable {
    line: Some(clip_object),
    arc: Some(clip_object),
    padstack: Some(clip_object),
    subc: Some(clip_subc),
    suppress_extobj_regen: true,
    subc_walks_parts: true,
    ..OpTable::new("clip", OpKind::Clip)
};

pub static REMOVE: OpTable = OpTable {
    line: Some(remove_object),
    arc: Some(remove_object),
    text: Some(remove_object),
    polygon: Some(remove_object),
    polygon_point: Some(remove_polygon_point),
    graphic: Some(remove_object),
    rat: Some(remove_object),
    padstack: Some(remove_object),
    subc: Some(remove_subc),
    before: Some(skip_locked),
    after: Some(forget_removed),
    subc_walks_parts: true,
    ..OpTable::new("remove", OpKind::Remove)
};

static TABLES: [&OpTable; 9] = [
    &MOVE,
    &COPY,
    &ROTATE90,
    &ROTATE,
    &CHANGE_SIZE,
    &CHANGE_CLEARANCE,
    &CHANGE_FLAG,
    &CLIP,
    &REMOVE,
];

/// The built-in table registered under `name`.
pub fn lookup_table(name: &str) -> Option<&'static OpTable> {
    TABLES.iter().copied().find(|t| t.name == name)
}

/// Edits an object in place: out of its index, changed, recorded if `edit`
/// reports a change, back into its index.
fn edit_object(board: &mut Board, id: ObjectId, edit: impl FnOnce(&mut Object) -> bool) -> Option<ObjectId> {
    let before = board.object(id)?.snapshot();
    board.detach_object(id);
    let changed = board.object_mut(id).is_some_and(edit);
    if changed {
        board.undo.record(UndoOp::Modify {
            before: Box::new(before),
        });
    }
    board.attach_object(id);
    if !changed {
        return None;
    }
    if let Some(sid) = board.object_subc(id) {
        board.subc_part_changed(sid);
    }
    Some(id)
}

/// Moves or rotates a whole composite as one recorded snapshot.
fn transform_subc(
    board: &mut Board,
    ctx: &OpCtx,
    sid: ObjectId,
    table: &OpTable,
    origin: impl FnOnce(Point) -> Point,
) -> Option<ObjectId> {
    let before = board.subc_snapshot(sid)?;
    board.undo.record(UndoOp::Subc {
        before: Box::new(before),
    });
    // Regeneration inside the walk may place the origin itself.
    if let Some(subc) = board.subc_mut(sid) {
        subc.origin = origin(subc.origin);
    }
    board.run_on_composite(sid, table, ctx, UndoMode::PerSubc)
}

/// Runs a value-changing table over a composite under one serial and reports
/// whether any child recorded a change.
fn batch_subc(board: &mut Board, ctx: &OpCtx, sid: ObjectId, table: &OpTable) -> Option<ObjectId> {
    let mark = board.undo.records().len();
    board.run_on_composite(sid, table, ctx, UndoMode::Batch)?;
    (board.undo.records().len() != mark).then_some(sid)
}

// ---- move ----

fn move_object(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::Move { dx, dy } = *ctx else {
        return None;
    };
    edit_object(board, t.id, |o| {
        o.geo.translate(dx, dy);
        dx != 0 || dy != 0
    })
}

fn move_point(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::Move { dx, dy } = *ctx else {
        return None;
    };
    let index = t.point?;
    edit_object(board, t.id, |o| o.geo.move_point(index, dx, dy) && (dx != 0 || dy != 0))
}

fn move_subc(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::Move { dx, dy } = *ctx else {
        return None;
    };
    if dx == 0 && dy == 0 {
        return None;
    }
    transform_subc(board, ctx, t.id, &MOVE, |p| p.translated(dx, dy))
}

// ---- copy ----

fn copy_object(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::Copy { dx, dy } = *ctx else {
        return None;
    };
    let mut copy = board.object(t.id)?.snapshot();
    copy.geo.translate(dx, dy);
    copy.flags.remove(ObjectFlags::SELECTED);
    let floater = copy.is_floater();
    let new = board.create_object_recorded(copy)?;
    if floater {
        return board.extobj_float_new(new).or(Some(new));
    }
    Some(new)
}

fn copy_subc(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::Copy { dx, dy } = *ctx else {
        return None;
    };
    board.dup_subc(t.id, true, dx, dy)
}

// ---- rotate ----

fn rotate90_object(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::Rotate90 { center, steps } = *ctx else {
        return None;
    };
    edit_object(board, t.id, |o| {
        o.geo.rotate90(center, steps);
        steps % 4 != 0
    })
}

fn rotate90_subc(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::Rotate90 { center, steps } = *ctx else {
        return None;
    };
    if steps % 4 == 0 {
        return None;
    }
    transform_subc(board, ctx, t.id, &ROTATE90, |p| p.rotated90(center, steps))
}

fn rotate_object(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::Rotate {
        center,
        angle,
        cos,
        sin,
    } = *ctx
    else {
        return None;
    };
    edit_object(board, t.id, |o| {
        let before = o.geo.clone();
        o.geo.rotate(center, cos, sin, angle);
        o.geo != before
    })
}

fn rotate_subc(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::Rotate { center, angle, cos, sin } = *ctx else {
        return None;
    };
    if angle % 360.0 == 0.0 {
        return None;
    }
    transform_subc(board, ctx, t.id, &ROTATE, |p| p.rotated(center, cos, sin))
}

// ---- size and clearance ----

fn change_size(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::ChangeSize { value, absolute } = *ctx else {
        return None;
    };
    edit_object(board, t.id, |o| {
        let Some(current) = o.geo.size() else {
            return false;
        };
        o.geo.set_size(if absolute { value } else { current.saturating_add(value) })
    })
}

fn change_size_subc(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    batch_subc(board, ctx, t.id, &CHANGE_SIZE)
}

fn change_clearance(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::ChangeClearance { value, absolute } = *ctx else {
        return None;
    };
    edit_object(board, t.id, |o| {
        let Some(current) = o.geo.clearance() else {
            return false;
        };
        o.geo.set_clearance(if absolute { value } else { current.saturating_add(value) })
    })
}

fn change_clearance_subc(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    batch_subc(board, ctx, t.id, &CHANGE_CLEARANCE)
}

// ---- flags ----

fn change_flag(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::ChangeFlag { flags, how } = *ctx else {
        return None;
    };
    let before = board.flags_of(t.id)?;
    let after = how.apply(before, flags);
    if after == before {
        return None;
    }
    board.undo.record(UndoOp::Flags { id: t.id, before });
    board.replace_flags(t.id, after);
    Some(t.id)
}

// ---- clip ----

/// Marks (or unmarks, on restore) the polygons a clearing object cuts into.
fn clip_object(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let OpCtx::Clip { restore } = *ctx else {
        return None;
    };
    let obj = board.object(t.id)?;
    if !obj.flags.contains(ObjectFlags::CLEARLINE) {
        return None;
    }
    let parent = obj.parent;
    let area = obj.bbox().bloated(obj.geo.clearance().unwrap_or(0));
    let hits = board.tree(parent.owner())?.query(&area);

    let mut changed = false;
    for id in hits {
        let Some(poly_obj) = board.object_mut(id) else {
            continue;
        };
        // Layer objects clip their own layer only; padstacks clip every layer.
        let same_layer = match (parent, poly_obj.parent) {
            (Parent::Layer { index: a, .. }, Parent::Layer { index: b, .. }) => a == b,
            (Parent::Data(_), Parent::Layer { .. }) => true,
            _ => false,
        };
        if !same_layer {
            continue;
        }
        let Some(poly) = poly_obj.geo.as_polygon_mut() else {
            continue;
        };
        changed |= if restore {
            poly.clipped_by.remove(&t.id)
        } else {
            poly.clipped_by.insert(t.id)
        };
    }
    changed.then_some(t.id)
}

fn clip_subc(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    board.run_on_composite(t.id, &CLIP, ctx, UndoMode::Normal)
}

// ---- remove ----

fn skip_locked(board: &mut Board, _ctx: &OpCtx, t: &Target) -> HookFlow {
    match board.object(t.id) {
        Some(obj) if obj.is_locked() => HookFlow::Skip,
        _ => HookFlow::Continue,
    }
}

fn forget_removed(board: &mut Board, _ctx: &OpCtx, t: &Target) {
    if !board.contains(t.id) && board.selection.primary() == Some(t.id) {
        board.selection.set_primary(None);
    }
}

fn remove_object(board: &mut Board, _ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    if board.object(t.id)?.is_floater() {
        match board.extobj_float_del(t.id) {
            FloatDel::NoOp => return None,
            FloatDel::RemoveFloater => {}
            FloatDel::RemoveSubc => {
                let sid = board.object_subc(t.id)?;
                return board.remove_subc_recorded(sid).then_some(t.id);
            }
        }
    }
    board.remove_object_recorded(t.id).then_some(t.id)
}

fn remove_polygon_point(board: &mut Board, _ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    let index = t.point?;
    edit_object(board, t.id, |o| {
        let Some(poly) = o.geo.as_polygon_mut() else {
            return false;
        };
        if poly.points.len() <= 3 || index >= poly.points.len() {
            return false;
        }
        poly.points.remove(index);
        true
    })
}

fn remove_subc(board: &mut Board, _ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    board.remove_subc_recorded(t.id).then_some(t.id)
}
