use boardkit_designer::{
    BoundingBox, Board, DataOwner, Line, ObjectId, Parent, Point, Primitive,
};

pub fn seg(x1: i64, y1: i64, x2: i64, y2: i64) -> Line {
    Line::new(Point::new(x1, y1), Point::new(x2, y2), 0)
}

/// A board with a `top` layer and a composite holding `lines` on it.
pub fn board_with_subc(lines: &[Line]) -> (Board, ObjectId, Vec<ObjectId>) {
    let mut board = Board::new();
    board.add_layer("top");
    let sid = board.new_subc(Point::new(0, 0), &["top"]);
    let parent = Parent::Layer {
        owner: DataOwner::Subc(sid),
        index: 0,
    };
    let ids = lines
        .iter()
        .map(|l| board.add_object(parent, Primitive::Line(l.clone())).unwrap())
        .collect();
    (board, sid, ids)
}

pub fn line_of(board: &Board, id: ObjectId) -> Line {
    board.object(id).unwrap().geo.as_line().unwrap().clone()
}

/// Union of the children's boxes, closed at the origin when empty.
pub fn children_bbox(board: &Board, sid: ObjectId) -> BoundingBox {
    let subc = board.subc(sid).unwrap();
    let mut bbox = BoundingBox::inverted();
    for id in subc.child_ids() {
        bbox.bump(&board.object(id).unwrap().bbox());
    }
    bbox.close(subc.origin);
    bbox
}
