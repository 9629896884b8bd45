use boardkit_designer::{
    apply, begin_operation, Board, BoardOptions, ObjectKind, OpParams, Point, Selector, Target,
};

use crate::common::{board_with_subc, children_bbox, line_of, seg};

fn move_by(dx: i64, dy: i64) -> OpParams {
    OpParams {
        dx: Some(dx),
        dy: Some(dy),
        ..Default::default()
    }
}

#[test]
fn test_undo_redo_move() {
    let mut board = Board::new();
    let top = board.add_layer("top");
    let id = board.add_line(top, seg(0, 0, 10, 0)).unwrap();
    let op = begin_operation("move", &move_by(5, 5)).unwrap();
    let target = Target::object(ObjectKind::Line, id);

    assert!(apply(&mut board, &op, Selector::Single(target)).unwrap());
    assert!(apply(&mut board, &op, Selector::Single(target)).unwrap());
    assert_eq!(line_of(&board, id).p1, Point::new(10, 10));

    assert!(board.undo());
    assert_eq!(line_of(&board, id).p1, Point::new(5, 5));
    assert!(board.undo());
    assert_eq!(line_of(&board, id).p1, Point::new(0, 0));
    assert!(!board.undo());

    assert!(board.redo());
    assert_eq!(line_of(&board, id).p1, Point::new(5, 5));
    assert!(board.is_indexed(id));
    assert_eq!(board.query(&board.bbox_of(id).unwrap()), vec![id]);
}

#[test]
fn test_new_edit_clears_redo() {
    let mut board = Board::new();
    let top = board.add_layer("top");
    let id = board.add_line(top, seg(0, 0, 10, 0)).unwrap();
    let op = begin_operation("move", &move_by(1, 0)).unwrap();
    let target = Target::object(ObjectKind::Line, id);

    apply(&mut board, &op, Selector::Single(target)).unwrap();
    board.undo();
    assert!(board.undo_log().can_redo());
    apply(&mut board, &op, Selector::Single(target)).unwrap();
    assert!(!board.undo_log().can_redo());
}

#[test]
fn test_undo_composite_move_restores_box() {
    let (mut board, sid, ids) = board_with_subc(&[seg(0, 0, 10, 10), seg(5, 5, 20, 20)]);
    let op = begin_operation("move", &move_by(3, 4)).unwrap();
    apply(&mut board, &op, Selector::Single(Target::subc(sid))).unwrap();

    assert!(board.undo());
    let subc = board.subc(sid).unwrap();
    assert_eq!(subc.origin, Point::new(0, 0));
    assert_eq!(subc.bbox(), children_bbox(&board, sid));
    assert_eq!(line_of(&board, ids[1]).p2, Point::new(20, 20));
    assert!(board.is_indexed(sid));
}

#[test]
fn test_undo_remove_restores_order() {
    let mut board = Board::new();
    let top = board.add_layer("top");
    let a = board.add_line(top, seg(0, 0, 1, 1)).unwrap();
    let b = board.add_line(top, seg(2, 2, 3, 3)).unwrap();
    let c = board.add_line(top, seg(4, 4, 5, 5)).unwrap();
    let op = begin_operation("remove", &OpParams::default()).unwrap();

    apply(&mut board, &op, Selector::Single(Target::object(ObjectKind::Line, b))).unwrap();
    assert_eq!(board.layers()[top].lines, vec![a, c]);
    assert!(board.undo());
    assert_eq!(board.layers()[top].lines, vec![a, b, c]);
    assert!(board.is_indexed(b));
}

#[test]
fn test_history_depth_is_bounded() {
    let mut board = Board::with_options(BoardOptions {
        max_serials: 3,
        ..Default::default()
    });
    let top = board.add_layer("top");
    let id = board.add_line(top, seg(0, 0, 10, 0)).unwrap();
    let op = begin_operation("move", &move_by(1, 0)).unwrap();
    let target = Target::object(ObjectKind::Line, id);
    for _ in 0..10 {
        apply(&mut board, &op, Selector::Single(target)).unwrap();
    }
    let mut steps = 0;
    while board.undo() {
        steps += 1;
    }
    assert!(steps <= 3);
    assert!(line_of(&board, id).p1.x > 0);
}
