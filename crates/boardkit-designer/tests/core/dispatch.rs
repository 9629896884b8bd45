use boardkit_designer::ops::tables::{CHANGE_CLEARANCE, CHANGE_FLAG, CHANGE_SIZE, CLIP, MOVE, REMOVE};
use boardkit_designer::ops::{HookFlow, OpKind};
use boardkit_designer::{
    apply, apply_single, begin_operation, Board, Error, FlagChange, ObjectFlags, ObjectId,
    ObjectKind, OpCtx, OpParams, OpTable, OperationError, PadStack, Point, Polygon, Selector,
    Target,
};

use crate::common::{line_of, seg};

fn board_with_line() -> (Board, ObjectId) {
    let mut board = Board::new();
    let top = board.add_layer("top");
    let id = board.add_line(top, seg(0, 0, 10, 0)).unwrap();
    (board, id)
}

fn mark_found(board: &mut Board, _ctx: &OpCtx, t: &Target) -> HookFlow {
    board.set_object_flags(t.id, ObjectFlags::FOUND, true);
    HookFlow::Continue
}

fn refuse(_board: &mut Board, _ctx: &OpCtx, _t: &Target) -> HookFlow {
    HookFlow::Skip
}

fn mark_warn(board: &mut Board, _ctx: &OpCtx, t: &Target) {
    board.set_object_flags(t.id, ObjectFlags::WARN, true);
}

fn shift_line(board: &mut Board, ctx: &OpCtx, t: &Target) -> Option<ObjectId> {
    apply_single(board, &MOVE, ctx, t).ok().flatten()
}

static HOOKED: OpTable = OpTable {
    line: Some(shift_line),
    before: Some(mark_found),
    after: Some(mark_warn),
    ..OpTable::new("hooked_move", OpKind::Move)
};

static GUARDED: OpTable = OpTable {
    line: Some(shift_line),
    before: Some(refuse),
    after: Some(mark_warn),
    ..OpTable::new("guarded_move", OpKind::Move)
};

#[test]
fn test_move_line() {
    let (mut board, id) = board_with_line();
    let target = Target::object(ObjectKind::Line, id);
    let result = apply_single(&mut board, &MOVE, &OpCtx::Move { dx: 5, dy: 7 }, &target).unwrap();
    assert_eq!(result, Some(id));
    let line = line_of(&board, id);
    assert_eq!((line.p1, line.p2), (Point::new(5, 7), Point::new(15, 7)));
    assert_eq!(board.query(&board.bbox_of(id).unwrap()), vec![id]);
}

#[test]
fn test_move_line_point() {
    let (mut board, id) = board_with_line();
    let target = Target::point(ObjectKind::LinePoint, id, 1);
    apply_single(&mut board, &MOVE, &OpCtx::Move { dx: 0, dy: 4 }, &target).unwrap();
    let line = line_of(&board, id);
    assert_eq!((line.p1, line.p2), (Point::new(0, 0), Point::new(10, 4)));
}

#[test]
fn test_foreign_context_rejected_before_mutation() {
    let (mut board, id) = board_with_line();
    let target = Target::object(ObjectKind::Line, id);
    let err = apply_single(&mut board, &MOVE, &OpCtx::Remove, &target).unwrap_err();
    assert!(err.is_invalid_context());
    assert!(board.object(id).is_some());
    assert!(board.undo_log().records().is_empty());
}

#[test]
fn test_missing_object_is_an_error() {
    let (mut board, _) = board_with_line();
    let op = begin_operation("remove", &OpParams::default()).unwrap();
    let target = Target::object(ObjectKind::Line, ObjectId(999));
    let err = apply(&mut board, &op, Selector::Single(target)).unwrap_err();
    assert!(matches!(
        err,
        Error::Operation(OperationError::ObjectNotFound { id: 999 })
    ));
}

#[test]
fn test_wrong_kind_is_noop() {
    let (mut board, id) = board_with_line();
    let target = Target::object(ObjectKind::Arc, id);
    let result = apply_single(&mut board, &MOVE, &OpCtx::Move { dx: 1, dy: 1 }, &target).unwrap();
    assert_eq!(result, None);
    assert_eq!(line_of(&board, id).p1, Point::new(0, 0));
}

#[test]
fn test_before_and_after_hooks_run() {
    let (mut board, id) = board_with_line();
    let target = Target::object(ObjectKind::Line, id);
    let result = apply_single(&mut board, &HOOKED, &OpCtx::Move { dx: 1, dy: 0 }, &target).unwrap();
    assert_eq!(result, Some(id));
    let flags = board.flags_of(id).unwrap();
    assert!(flags.contains(ObjectFlags::FOUND | ObjectFlags::WARN));
    assert_eq!(line_of(&board, id).p1, Point::new(1, 0));
}

#[test]
fn test_before_hook_can_skip() {
    let (mut board, id) = board_with_line();
    let target = Target::object(ObjectKind::Line, id);
    let result = apply_single(&mut board, &GUARDED, &OpCtx::Move { dx: 1, dy: 0 }, &target).unwrap();
    assert_eq!(result, None);
    assert!(!board.flags_of(id).unwrap().contains(ObjectFlags::WARN));
    assert_eq!(line_of(&board, id).p1, Point::new(0, 0));
}

#[test]
fn test_remove_skips_locked() {
    let (mut board, id) = board_with_line();
    board.set_object_flags(id, ObjectFlags::LOCK, true);
    let target = Target::object(ObjectKind::Line, id);
    assert_eq!(apply_single(&mut board, &REMOVE, &OpCtx::Remove, &target).unwrap(), None);
    assert!(board.object(id).is_some());

    board.set_object_flags(id, ObjectFlags::LOCK, false);
    assert_eq!(apply_single(&mut board, &REMOVE, &OpCtx::Remove, &target).unwrap(), Some(id));
    assert!(board.object(id).is_none());
    assert!(!board.is_indexed(id));
}

#[test]
fn test_remove_polygon_point_keeps_triangles() {
    let mut board = Board::new();
    let top = board.add_layer("top");
    let square = board.add_polygon(top, Polygon::rect(0, 0, 10, 10)).unwrap();
    let target = Target::point(ObjectKind::PolygonPoint, square, 0);
    assert_eq!(apply_single(&mut board, &REMOVE, &OpCtx::Remove, &target).unwrap(), Some(square));
    assert_eq!(apply_single(&mut board, &REMOVE, &OpCtx::Remove, &target).unwrap(), None);
    assert!(board.object(square).is_some());
}

#[test]
fn test_change_flag_toggle() {
    let (mut board, id) = board_with_line();
    let target = Target::object(ObjectKind::Line, id);
    let ctx = OpCtx::ChangeFlag {
        flags: ObjectFlags::LOCK,
        how: FlagChange::Toggle,
    };
    apply_single(&mut board, &CHANGE_FLAG, &ctx, &target).unwrap();
    assert!(board.flags_of(id).unwrap().contains(ObjectFlags::LOCK));
    apply_single(&mut board, &CHANGE_FLAG, &ctx, &target).unwrap();
    assert!(!board.flags_of(id).unwrap().contains(ObjectFlags::LOCK));
}

#[test]
fn test_clip_marks_polygons_on_every_layer() {
    let mut board = Board::new();
    let top = board.add_layer("top");
    let bottom = board.add_layer("bottom");
    let upper = board.add_polygon(top, Polygon::rect(0, 0, 10, 10)).unwrap();
    let lower = board.add_polygon(bottom, Polygon::rect(0, 0, 10, 10)).unwrap();
    let via = board.add_padstack(PadStack::via(Point::new(5, 5), 2, 1)).unwrap();
    let target = Target::object(ObjectKind::PadStack, via);

    // Only clearing objects clip.
    assert_eq!(apply_single(&mut board, &CLIP, &OpCtx::Clip { restore: false }, &target).unwrap(), None);

    board.set_object_flags(via, ObjectFlags::CLEARLINE, true);
    assert_eq!(
        apply_single(&mut board, &CLIP, &OpCtx::Clip { restore: false }, &target).unwrap(),
        Some(via)
    );
    for poly in [upper, lower] {
        let Some(p) = board.object(poly).and_then(|o| o.geo.as_polygon()) else {
            panic!("polygon vanished");
        };
        assert!(p.clipped_by.contains(&via));
    }

    apply_single(&mut board, &CLIP, &OpCtx::Clip { restore: true }, &target).unwrap();
    let p = board.object(upper).and_then(|o| o.geo.as_polygon()).unwrap();
    assert!(p.clipped_by.is_empty());
}

#[test]
fn test_line_clips_own_layer_only() {
    let mut board = Board::new();
    let top = board.add_layer("top");
    let bottom = board.add_layer("bottom");
    let upper = board.add_polygon(top, Polygon::rect(0, 0, 10, 10)).unwrap();
    let lower = board.add_polygon(bottom, Polygon::rect(0, 0, 10, 10)).unwrap();
    let line = board.add_line(top, seg(2, 2, 8, 8)).unwrap();
    board.set_object_flags(line, ObjectFlags::CLEARLINE, true);

    let target = Target::object(ObjectKind::Line, line);
    apply_single(&mut board, &CLIP, &OpCtx::Clip { restore: false }, &target).unwrap();
    let clipped = |id| {
        board
            .object(id)
            .and_then(|o| o.geo.as_polygon())
            .is_some_and(|p| p.clipped_by.contains(&line))
    };
    assert!(clipped(upper));
    assert!(!clipped(lower));
}

#[test]
fn test_relative_size_saturates() {
    let (mut board, id) = board_with_line();
    let target = Target::object(ObjectKind::Line, id);
    let grow = OpCtx::ChangeSize {
        value: i64::MAX,
        absolute: false,
    };
    assert_eq!(apply_single(&mut board, &CHANGE_SIZE, &grow, &target).unwrap(), Some(id));
    assert_eq!(line_of(&board, id).thickness, i64::MAX);

    // Already at the ceiling: nothing changes.
    assert_eq!(apply_single(&mut board, &CHANGE_SIZE, &grow, &target).unwrap(), None);
}

#[test]
fn test_relative_clearance_saturates() {
    let (mut board, id) = board_with_line();
    let target = Target::object(ObjectKind::Line, id);
    let grow = OpCtx::ChangeClearance {
        value: 5,
        absolute: true,
    };
    apply_single(&mut board, &CHANGE_CLEARANCE, &grow, &target).unwrap();
    let huge = OpCtx::ChangeClearance {
        value: i64::MAX,
        absolute: false,
    };
    assert_eq!(apply_single(&mut board, &CHANGE_CLEARANCE, &huge, &target).unwrap(), Some(id));
    assert_eq!(line_of(&board, id).clearance, i64::MAX);

    let shrink = OpCtx::ChangeClearance {
        value: i64::MIN,
        absolute: false,
    };
    assert_eq!(apply_single(&mut board, &CHANGE_CLEARANCE, &shrink, &target).unwrap(), Some(id));
    assert_eq!(line_of(&board, id).clearance, 0);
}
