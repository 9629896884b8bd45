use boardkit_designer::ops::tables::{CHANGE_SIZE, MOVE};
use boardkit_designer::{
    apply, apply_single, begin_operation, BoundingBox, Line, ObjectKind, OpCtx, OpParams, Point,
    Selector, Target, UndoMode,
};
use proptest::prelude::*;

use crate::common::{board_with_subc, children_bbox, line_of, seg};

#[test]
fn test_move_composite_shifts_box() {
    let (mut board, sid, ids) = board_with_subc(&[seg(0, 0, 10, 10), seg(5, 5, 20, 20)]);
    assert_eq!(board.subc(sid).unwrap().bbox(), BoundingBox::new(0, 0, 20, 20));

    let result = apply_single(&mut board, &MOVE, &OpCtx::Move { dx: 3, dy: 4 }, &Target::subc(sid)).unwrap();
    assert_eq!(result, Some(sid));

    let subc = board.subc(sid).unwrap();
    assert_eq!(subc.bbox(), BoundingBox::new(3, 4, 23, 24));
    assert_eq!(subc.origin, Point::new(3, 4));
    assert!(!subc.is_bbox_dirty());
    assert_eq!(line_of(&board, ids[0]).p1, Point::new(3, 4));
    assert_eq!(board.query(&BoundingBox::new(22, 23, 22, 23)), vec![sid]);
    assert!(board.query(&BoundingBox::new(1, 1, 1, 1)).is_empty());
}

#[test]
fn test_move_composite_records_one_snapshot() {
    let (mut board, sid, _) = board_with_subc(&[seg(0, 0, 10, 10), seg(5, 5, 20, 20)]);
    apply_single(&mut board, &MOVE, &OpCtx::Move { dx: 3, dy: 4 }, &Target::subc(sid)).unwrap();
    assert_eq!(board.undo_log().records().len(), 1);
}

#[test]
fn test_zero_move_is_noop() {
    let (mut board, sid, _) = board_with_subc(&[seg(0, 0, 10, 10)]);
    let op = begin_operation("move", &OpParams::default()).unwrap();
    let changed = apply(&mut board, &op, Selector::Single(Target::subc(sid))).unwrap();
    assert!(!changed);
    assert!(board.undo_log().records().is_empty());
    assert_eq!(board.undo_log().serial(), 0);
}

#[test]
fn test_run_on_missing_composite() {
    let (mut board, _, ids) = board_with_subc(&[seg(0, 0, 10, 10)]);
    let ctx = OpCtx::Move { dx: 1, dy: 1 };
    assert_eq!(board.run_on_composite(ids[0], &MOVE, &ctx, UndoMode::Normal), None);
}

#[test]
fn test_normal_mode_records_each_child() {
    let (mut board, sid, _) = board_with_subc(&[seg(0, 0, 10, 10), seg(5, 5, 20, 20)]);
    let ctx = OpCtx::Move { dx: 1, dy: 0 };
    assert_eq!(board.run_on_composite(sid, &MOVE, &ctx, UndoMode::Normal), Some(sid));
    assert_eq!(board.undo_log().records().len(), 2);
    assert_eq!(board.subc(sid).unwrap().bbox(), BoundingBox::new(1, 0, 21, 20));
}

#[test]
fn test_per_subc_mode_records_nothing() {
    let (mut board, sid, _) = board_with_subc(&[seg(0, 0, 10, 10)]);
    let ctx = OpCtx::Move { dx: 1, dy: 0 };
    board.run_on_composite(sid, &MOVE, &ctx, UndoMode::PerSubc);
    assert!(board.undo_log().records().is_empty());
    assert_eq!(board.subc(sid).unwrap().bbox(), BoundingBox::new(1, 0, 11, 10));
}

#[test]
fn test_change_size_on_empty_change_reports_nothing() {
    let (mut board, sid, _) = board_with_subc(&[seg(0, 0, 10, 10)]);
    let ctx = OpCtx::ChangeSize {
        value: 0,
        absolute: true,
    };
    assert_eq!(apply_single(&mut board, &CHANGE_SIZE, &ctx, &Target::subc(sid)).unwrap(), None);
}

fn line_strategy() -> impl Strategy<Value = Line> {
    (
        -1_000_000i64..1_000_000,
        -1_000_000i64..1_000_000,
        -1_000_000i64..1_000_000,
        -1_000_000i64..1_000_000,
        0i64..10_000,
    )
        .prop_map(|(x1, y1, x2, y2, t)| Line::new(Point::new(x1, y1), Point::new(x2, y2), t))
}

proptest! {
    #[test]
    fn prop_box_closes_over_children_after_move(
        lines in prop::collection::vec(line_strategy(), 1..6),
        dx in -50_000i64..50_000,
        dy in -50_000i64..50_000,
    ) {
        let (mut board, sid, _) = board_with_subc(&lines);
        apply_single(&mut board, &MOVE, &OpCtx::Move { dx, dy }, &Target::subc(sid)).unwrap();

        let bbox = board.subc(sid).unwrap().bbox();
        prop_assert_eq!(bbox, children_bbox(&board, sid));
        prop_assert!(board.query(&bbox).contains(&sid));
    }

    #[test]
    fn prop_batch_size_change_is_one_undo_step(
        lines in prop::collection::vec(line_strategy(), 1..6),
        delta in 1i64..1_000,
    ) {
        let (mut board, sid, ids) = board_with_subc(&lines);
        let before: Vec<i64> = ids.iter().map(|id| line_of(&board, *id).thickness).collect();

        let params = OpParams { value: Some(delta), ..Default::default() };
        let op = begin_operation("change_size", &params).unwrap();
        prop_assert!(apply(&mut board, &op, Selector::Single(Target::subc(sid))).unwrap());

        let records = board.undo_log().records();
        prop_assert_eq!(records.len(), ids.len());
        prop_assert!(records.iter().all(|r| r.serial == records[0].serial));

        prop_assert!(board.undo());
        let after: Vec<i64> = ids.iter().map(|id| line_of(&board, *id).thickness).collect();
        prop_assert_eq!(after, before);
        prop_assert!(!board.undo_log().can_undo());
        prop_assert_eq!(board.subc(sid).unwrap().bbox(), children_bbox(&board, sid));
    }
}

#[test]
fn test_parts_of_composite_are_lines() {
    let (board, sid, ids) = board_with_subc(&[seg(0, 0, 10, 10)]);
    assert_eq!(board.kind_of(ids[0]), Some(ObjectKind::Line));
    assert_eq!(board.kind_of(sid), Some(ObjectKind::Composite));
    assert_eq!(board.object_subc(ids[0]), Some(sid));
}
