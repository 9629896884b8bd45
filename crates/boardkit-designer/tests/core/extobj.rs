use std::rc::Rc;

use boardkit_designer::extobj::line_of_vias::PITCH_ATTR;
use boardkit_designer::extobj::{ExtObjLink, LinkState};
use boardkit_designer::ops::tables::{COPY, MOVE, REMOVE};
use boardkit_designer::{
    apply, apply_single, begin_operation, Board, BoundingBox, DataOwner, ExtObjError,
    ExtObjRegistry, ExtObject, FloatDel, FloatNew, HookSet, Line, LineOfVias, ObjectFlags,
    ObjectId, ObjectKind, OpCtx, OpParams, Parent, Point, Primitive, Selector, Target,
};
use proptest::prelude::*;

use crate::common::seg;

const MM: i64 = 1_000_000;

fn convert_line(len: i64) -> (Board, ObjectId) {
    convert(seg(0, 0, len, 0))
}

fn convert(line: Line) -> (Board, ObjectId) {
    let mut board = Board::new();
    board.register_extobj(Rc::new(LineOfVias::new())).unwrap();
    let top = board.add_layer("top");
    let line = board.add_line(top, line).unwrap();
    let sid = board
        .extobj_convert(LineOfVias::NAME, DataOwner::Board, &[line], true)
        .unwrap();
    (board, sid)
}

fn floaters(board: &Board, sid: ObjectId) -> Vec<ObjectId> {
    board
        .subc(sid)
        .unwrap()
        .child_ids()
        .into_iter()
        .filter(|id| board.object(*id).is_some_and(|o| o.is_floater()))
        .collect()
}

fn via_positions(board: &Board, sid: ObjectId) -> Vec<Point> {
    board
        .subc(sid)
        .unwrap()
        .data
        .padstacks
        .iter()
        .filter_map(|id| board.object(*id)?.geo.as_padstack().map(|p| p.pos))
        .collect()
}

#[test]
fn test_convert_is_one_undo_step() {
    let mut board = Board::new();
    board.register_extobj(Rc::new(LineOfVias::new())).unwrap();
    let top = board.add_layer("top");
    let line = board.add_line(top, seg(0, 0, 10 * MM, 0)).unwrap();
    let sid = board
        .extobj_convert(LineOfVias::NAME, DataOwner::Board, &[line], true)
        .unwrap();

    assert!(board.undo());
    assert!(board.subc(sid).is_none());
    assert!(board.object(line).is_some());
    assert!(board.is_indexed(line));
    assert!(!board.undo_log().can_undo());
}

#[test]
fn test_floater_is_marked() {
    let (board, sid) = convert_line(10 * MM);
    let edit = floaters(&board, sid);
    assert_eq!(edit.len(), 1);
    let obj = board.object(edit[0]).unwrap();
    assert!(obj.flags.contains(ObjectFlags::FLOATER));
    assert!(!obj.is_selected());
    assert_eq!(obj.attributes.get("extobj::role").map(String::as_str), Some("edit"));
}

#[test]
fn test_editing_floater_regenerates() {
    let (mut board, sid) = convert_line(10 * MM);
    let edit = floaters(&board, sid)[0];

    let target = Target::object(ObjectKind::Line, edit);
    apply_single(&mut board, &MOVE, &OpCtx::Move { dx: 0, dy: 2 * MM }, &target).unwrap();

    assert_eq!(
        via_positions(&board, sid),
        vec![Point::new(0, 2 * MM), Point::new(4 * MM, 2 * MM), Point::new(8 * MM, 2 * MM)]
    );
    let subc = board.subc(sid).unwrap();
    assert_eq!(
        subc.bbox(),
        BoundingBox::new(-300_000, 1_700_000, 8_300_000, 2_300_000)
    );
    assert!(board.query(&BoundingBox::at(Point::new(4 * MM, 2 * MM))).contains(&sid));
    assert!(!board.object(edit).unwrap().is_editing());
}

#[test]
fn test_lengthening_floater_adds_vias() {
    let (mut board, sid) = convert_line(10 * MM);
    let edit = floaters(&board, sid)[0];
    let target = Target::point(ObjectKind::LinePoint, edit, 1);
    apply_single(&mut board, &MOVE, &OpCtx::Move { dx: 4 * MM, dy: 0 }, &target).unwrap();
    assert_eq!(via_positions(&board, sid).len(), 4);
}

#[test]
fn test_undo_floater_edit_regenerates() {
    let (mut board, sid) = convert_line(10 * MM);
    let edit = floaters(&board, sid)[0];

    let params = OpParams {
        dy: Some(2 * MM),
        ..Default::default()
    };
    let op = begin_operation("move", &params).unwrap();
    let target = Target::object(ObjectKind::Line, edit);
    assert!(apply(&mut board, &op, Selector::Single(target)).unwrap());

    assert!(board.undo());
    assert_eq!(
        via_positions(&board, sid),
        vec![Point::new(0, 0), Point::new(4 * MM, 0), Point::new(8 * MM, 0)]
    );
    assert!(board.redo());
    assert_eq!(via_positions(&board, sid)[0], Point::new(0, 2 * MM));
}

#[test]
fn test_deleting_last_floater_removes_composite() {
    let (mut board, sid) = convert_line(10 * MM);
    let edit = floaters(&board, sid)[0];
    let area = board.subc(sid).unwrap().bbox();

    let target = Target::object(ObjectKind::Line, edit);
    let result = apply_single(&mut board, &REMOVE, &OpCtx::Remove, &target).unwrap();
    assert_eq!(result, Some(edit));
    assert!(board.subc(sid).is_none());
    assert!(board.object(edit).is_none());
    assert!(!board.is_indexed(sid));
    assert!(board.query(&area).is_empty());
    assert!(board.subc_ids().is_empty());

    assert!(board.undo());
    assert!(board.subc(sid).is_some());
    assert_eq!(via_positions(&board, sid).len(), 3);
    assert!(board.is_indexed(sid));
}

#[test]
fn test_float_del_when_regeneration_is_off() {
    let (mut board, sid) = convert_line(10 * MM);
    let mut options = *board.options();
    options.regenerate_on_edit = false;
    board.set_options(options);

    let edit = floaters(&board, sid)[0];
    assert_eq!(board.extobj_float_del(edit), FloatDel::RemoveFloater);
}

#[test]
fn test_copied_floater_stays_in_composite() {
    let (mut board, sid) = convert_line(10 * MM);
    let edit = floaters(&board, sid)[0];
    let target = Target::object(ObjectKind::Line, edit);
    let copy = apply_single(&mut board, &COPY, &OpCtx::Copy { dx: 0, dy: 5 * MM }, &target)
        .unwrap()
        .unwrap();
    assert_ne!(copy, edit);
    assert_eq!(board.object_subc(copy), Some(sid));
    assert_eq!(floaters(&board, sid).len(), 2);
}

#[test]
fn test_copy_composite_keeps_floaters() {
    let (mut board, sid) = convert_line(10 * MM);
    let target = Target::subc(sid);
    let dup = apply_single(&mut board, &COPY, &OpCtx::Copy { dx: 0, dy: 5 * MM }, &target)
        .unwrap()
        .unwrap();
    assert_ne!(dup, sid);
    assert_eq!(floaters(&board, dup).len(), 1);
    assert_eq!(via_positions(&board, dup)[0], Point::new(0, 5 * MM));
    assert_eq!(board.subc(dup).unwrap().attribute("extobj"), Some(LineOfVias::NAME));
}

#[test]
fn test_registry_generation_invalidates_links() {
    let (mut board, sid) = convert_line(10 * MM);
    assert!(board.extobj_descriptor(sid).is_some());
    let before = board.extobj_registry().generation();

    board.unregister_extobj(LineOfVias::NAME).unwrap();
    assert!(board.extobj_registry().generation() > before);
    assert!(board.extobj_descriptor(sid).is_none());
    assert_eq!(board.subc(sid).unwrap().extobj.state(), LinkState::LinkInvalid);

    // Without a descriptor, floater edits are plain edits.
    let edit = floaters(&board, sid)[0];
    let target = Target::object(ObjectKind::Line, edit);
    apply_single(&mut board, &MOVE, &OpCtx::Move { dx: 0, dy: MM }, &target).unwrap();
    assert_eq!(via_positions(&board, sid)[0], Point::new(0, 0));

    board.register_extobj(Rc::new(LineOfVias::new())).unwrap();
    assert!(board.extobj_descriptor(sid).is_some());
    assert!(matches!(
        board.subc(sid).unwrap().extobj.state(),
        LinkState::Linked(_)
    ));
}

#[test]
fn test_duplicate_registration_refused() {
    let mut board = Board::new();
    board.register_extobj(Rc::new(LineOfVias::new())).unwrap();
    let err = board.register_extobj(Rc::new(LineOfVias::new())).unwrap_err();
    assert_eq!(
        err,
        ExtObjError::DuplicateName {
            name: LineOfVias::NAME.to_string()
        }
    );
    assert!(board
        .lookup_extobj(LineOfVias::NAME)
        .is_some_and(|d| d.hooks() == HookSet::all()));
}

#[test]
fn test_pitch_attribute_undo() {
    let (mut board, sid) = convert_line(10 * MM);
    assert!(board.set_subc_attribute(sid, PITCH_ATTR, Some("2mm")));
    assert_eq!(via_positions(&board, sid).len(), 6);
    assert!(board.undo());
    assert_eq!(board.subc(sid).unwrap().attribute(PITCH_ATTR), Some("4mm"));
    assert_eq!(via_positions(&board, sid).len(), 3);
}

/// A descriptor with a name and nothing else.
#[derive(Debug)]
struct Named(&'static str);

impl ExtObject for Named {
    fn name(&self) -> &str {
        self.0
    }

    fn hooks(&self) -> HookSet {
        HookSet::empty()
    }
}

/// Every copied floater gets a composite of its own.
#[derive(Debug)]
struct Spawner;

impl ExtObject for Spawner {
    fn name(&self) -> &str {
        "spawner"
    }

    fn hooks(&self) -> HookSet {
        HookSet::FLOAT_NEW
    }

    fn float_new(&self, _board: &Board, _subc: ObjectId, _floater: ObjectId) -> Result<FloatNew, ExtObjError> {
        Ok(FloatNew::Spawn)
    }
}

/// Floaters cannot be deleted.
#[derive(Debug)]
struct Keeper;

impl ExtObject for Keeper {
    fn name(&self) -> &str {
        "keeper"
    }

    fn hooks(&self) -> HookSet {
        HookSet::FLOAT_DEL
    }

    fn float_del(&self, _board: &Board, _subc: ObjectId, _floater: ObjectId) -> Result<FloatDel, ExtObjError> {
        Ok(FloatDel::NoOp)
    }
}

/// Creates its composite, then gives up.
#[derive(Debug)]
struct HalfConverter;

impl ExtObject for HalfConverter {
    fn name(&self) -> &str {
        "half"
    }

    fn hooks(&self) -> HookSet {
        HookSet::CONV_OBJS
    }

    fn conv_objs(
        &self,
        board: &mut Board,
        dst: DataOwner,
        _objs: &[ObjectId],
        copy_from: Option<ObjectId>,
    ) -> Result<ObjectId, ExtObjError> {
        board.exto_create(dst, self.name(), &[("top", None)], Point::new(0, 0), copy_from)?;
        Err(ExtObjError::declined(self.name(), "source is not a closed outline"))
    }
}

/// A composite linked to `descriptor` holding one plain line and one
/// floater line. Setup is closed as its own undo step.
fn linked_subc(descriptor: Rc<dyn ExtObject>) -> (Board, ObjectId, ObjectId, ObjectId) {
    let mut board = Board::new();
    let name = descriptor.name().to_string();
    board.register_extobj(descriptor).unwrap();
    board.add_layer("top");
    let sid = board
        .exto_create(DataOwner::Board, &name, &[("top", None)], Point::new(0, 0), None)
        .unwrap();
    let parent = Parent::Layer {
        owner: DataOwner::Subc(sid),
        index: 0,
    };
    let plain = board
        .add_object(parent, Primitive::Line(seg(0, 0, 10 * MM, 0)))
        .unwrap();
    let floater = board
        .add_object(parent, Primitive::Line(seg(0, MM, 10 * MM, MM)))
        .unwrap();
    board.set_object_flags(floater, ObjectFlags::FLOATER, true);
    board.undo_log().inc_serial();
    (board, sid, plain, floater)
}

#[test]
fn test_spawned_floater_gets_its_own_composite() {
    let (mut board, sid, _, floater) = linked_subc(Rc::new(Spawner));
    let op = begin_operation(
        "copy",
        &OpParams {
            dy: Some(5 * MM),
            ..Default::default()
        },
    )
    .unwrap();
    let target = Target::object(ObjectKind::Line, floater);
    assert!(apply(&mut board, &op, Selector::Single(target)).unwrap());

    assert_eq!(board.subc_ids().len(), 2);
    let dup = board.subc_ids().iter().copied().find(|id| *id != sid).unwrap();
    assert_eq!(board.subc(sid).unwrap().child_ids().len(), 2);

    let children = board.subc(dup).unwrap().child_ids();
    assert_eq!(children.len(), 2);
    let spawned = floaters(&board, dup);
    assert_eq!(spawned.len(), 1);
    assert_eq!(board.object_subc(spawned[0]), Some(dup));
    assert_eq!(
        board.object(spawned[0]).unwrap().geo.as_line().unwrap().p1,
        Point::new(0, 6 * MM)
    );
    assert_eq!(board.subc(dup).unwrap().attribute("extobj"), Some("spawner"));

    // Copy, detach and spawn are one step.
    assert!(board.undo());
    assert_eq!(board.subc_ids(), &[sid]);
    assert_eq!(board.subc(sid).unwrap().child_ids().len(), 2);
    assert_eq!(floaters(&board, sid), vec![floater]);
}

#[test]
fn test_undeletable_floater_is_kept() {
    let (mut board, sid, plain, floater) = linked_subc(Rc::new(Keeper));
    let records = board.undo_log().records().len();

    let op = begin_operation("remove", &OpParams::default()).unwrap();
    let target = Target::object(ObjectKind::Line, floater);
    assert!(!apply(&mut board, &op, Selector::Single(target)).unwrap());

    assert!(board.object(floater).is_some());
    let children = board.subc(sid).unwrap().child_ids();
    assert_eq!(children.len(), 2);
    assert!(children.contains(&plain) && children.contains(&floater));
    assert_eq!(board.undo_log().records().len(), records);
    assert_eq!(board.extobj_float_del(floater), FloatDel::NoOp);
}

#[test]
fn test_declined_conversion_leaves_nothing_behind() {
    let mut board = Board::new();
    board.register_extobj(Rc::new(HalfConverter)).unwrap();
    let top = board.add_layer("top");
    let line = board.add_line(top, seg(0, 0, 10 * MM, 0)).unwrap();
    board.undo_log().inc_serial();
    let records = board.undo_log().records().len();
    let serial = board.undo_log().serial();

    assert_eq!(board.extobj_convert("half", DataOwner::Board, &[line], true), None);
    assert!(board.subc_ids().is_empty());
    assert_eq!(board.undo_log().records().len(), records);
    assert_eq!(board.undo_log().serial(), serial);
    assert!(board.object(line).is_some());
    assert!(board.is_indexed(line));
}

#[test]
fn test_link_follows_name_to_a_new_slot() {
    let (mut board, sid) = convert_line(10 * MM);
    assert!(board.extobj_descriptor(sid).is_some());
    match board.subc(sid).unwrap().extobj.state() {
        LinkState::Linked(handle) => assert_eq!(handle.index().get(), 1),
        state => panic!("unexpected link state {state:?}"),
    }

    // Another descriptor takes over the vacated slot.
    board.unregister_extobj(LineOfVias::NAME).unwrap();
    board.register_extobj(Rc::new(Named("filler"))).unwrap();
    assert!(board.extobj_descriptor(sid).is_none());
    assert_eq!(board.subc(sid).unwrap().extobj.state(), LinkState::LinkInvalid);

    board.register_extobj(Rc::new(LineOfVias::new())).unwrap();
    let descriptor = board.extobj_descriptor(sid).unwrap();
    assert_eq!(descriptor.name(), LineOfVias::NAME);
    match board.subc(sid).unwrap().extobj.state() {
        LinkState::Linked(handle) => assert_eq!(handle.index().get(), 2),
        state => panic!("unexpected link state {state:?}"),
    }
}

#[derive(Debug, Clone)]
enum RegistryStep {
    Register(usize),
    Unregister(usize),
}

const STEP_NAMES: [&str; 3] = ["a", "b", "c"];

fn registry_step() -> impl Strategy<Value = RegistryStep> {
    prop_oneof![
        (0..STEP_NAMES.len()).prop_map(RegistryStep::Register),
        (0..STEP_NAMES.len()).prop_map(RegistryStep::Unregister),
    ]
}

proptest! {
    #[test]
    fn prop_link_resolves_like_lookup(steps in prop::collection::vec(registry_step(), 0..24)) {
        let mut registry = ExtObjRegistry::new();
        let link = ExtObjLink::new(Some("a".to_string()));
        for step in steps {
            match step {
                RegistryStep::Register(i) => {
                    let _ = registry.register(Rc::new(Named(STEP_NAMES[i])));
                }
                RegistryStep::Unregister(i) => {
                    let _ = registry.unregister(STEP_NAMES[i]);
                }
            }
            match (registry.resolve(&link), registry.lookup("a")) {
                (Some(resolved), Some(current)) => {
                    prop_assert!(Rc::ptr_eq(&resolved, &current));
                    prop_assert_eq!(resolved.name(), "a");
                }
                (None, None) => {}
                (resolved, current) => prop_assert!(
                    false,
                    "resolve gave {:?}, lookup gave {:?}",
                    resolved.map(|d| d.name().to_string()),
                    current.map(|d| d.name().to_string())
                ),
            }
        }
    }
}

#[test]
fn test_regeneration_is_stable() {
    let (mut board, sid) = convert(seg(0, 0, 7 * MM, 3 * MM));
    let bbox = board.subc(sid).unwrap().bbox();
    let vias = via_positions(&board, sid);
    assert!(!vias.is_empty());

    let descriptor = board.extobj_descriptor(sid).unwrap();
    for _ in 0..2 {
        descriptor.float_geo(&mut board, sid, None).unwrap();
        assert_eq!(board.subc(sid).unwrap().bbox(), bbox);
        assert_eq!(via_positions(&board, sid), vias);
        assert_eq!(floaters(&board, sid).len(), 1);
    }

    let (again, other) = convert(seg(0, 0, 7 * MM, 3 * MM));
    assert_eq!(again.subc(other).unwrap().bbox(), bbox);
}
