//! The board document.
//!
//! A [`Board`] owns every object of a layout: the primitive arena, the
//! composites, the root data container with its spatial index, the undo log
//! and the extended-object registry. Objects refer to their containers
//! through [`Parent`] ids rather than pointers, so any object can be looked up
//! and mutated through the board without borrow conflicts.

mod history;
mod types;

pub use types::{Data, DataOwner, Layer, Parent};

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use boardkit_core::{
    BoundingBox, Coord, ExtObjError, FloaterBboxPolicy, ObjectFlags, ObjectId, ObjectKind,
    OperationError, Point, Result,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extobj::{ExtObjHandle, ExtObjRegistry, ExtObject, EXTOBJ_ATTR};
use crate::model::{Arc, Geometry, Graphic, Line, PadStack, Polygon, Primitive, RatLine, Text};
use crate::object_store::{Object, ObjectStore};
use crate::selection::SelectionManager;
use crate::spatial_index::SpatialIndex;
use crate::subc::{Subc, SubcSnapshot};
use crate::undo::{Removed, UndoLog, UndoOp};

/// Engine options a host can tune.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardOptions {
    /// Undo history depth, in undo steps.
    pub max_serials: usize,
    /// Spatial index cell edge.
    pub cell_size: Coord,
    /// Whether floaters count towards a composite's full bounding box.
    pub floater_bbox: FloaterBboxPolicy,
    /// Master switch for the extended-object hook protocol.
    pub regenerate_on_edit: bool,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            max_serials: 100,
            cell_size: 1_000_000,
            floater_bbox: FloaterBboxPolicy::Exclude,
            regenerate_on_edit: true,
        }
    }
}

#[derive(Debug)]
pub struct Board {
    pub(crate) store: ObjectStore,
    pub(crate) subcs: HashMap<ObjectId, Subc>,
    pub(crate) root: Data,
    pub(crate) undo: UndoLog,
    pub(crate) extobj: ExtObjRegistry,
    pub(crate) options: BoardOptions,
    pub(crate) selection: SelectionManager,
    uid: Uuid,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self::with_options(BoardOptions::default())
    }

    pub fn with_options(options: BoardOptions) -> Self {
        let root = Data {
            tree: Some(SpatialIndex::new(options.cell_size)),
            ..Data::new()
        };
        let uid = Uuid::new_v4();
        tracing::debug!(board = %uid, "board created");
        Self {
            store: ObjectStore::new(),
            subcs: HashMap::new(),
            root,
            undo: UndoLog::new(options.max_serials),
            extobj: ExtObjRegistry::new(),
            options,
            selection: SelectionManager::new(),
            uid,
        }
    }

    /// Session identity, used to tag log spans.
    pub fn id(&self) -> Uuid {
        self.uid
    }

    pub fn options(&self) -> &BoardOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: BoardOptions) {
        self.options = options;
    }

    pub fn undo_log(&self) -> &UndoLog {
        &self.undo
    }

    pub fn undo_log_mut(&mut self) -> &mut UndoLog {
        &mut self.undo
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn root(&self) -> &Data {
        &self.root
    }

    // ---- extended-object registry ----

    pub fn register_extobj(&mut self, descriptor: Rc<dyn ExtObject>) -> std::result::Result<ExtObjHandle, ExtObjError> {
        self.extobj.register(descriptor)
    }

    pub fn unregister_extobj(&mut self, name: &str) -> std::result::Result<Rc<dyn ExtObject>, ExtObjError> {
        self.extobj.unregister(name)
    }

    pub fn lookup_extobj(&self, name: &str) -> Option<Rc<dyn ExtObject>> {
        self.extobj.lookup(name)
    }

    pub fn extobj_registry(&self) -> &ExtObjRegistry {
        &self.extobj
    }

    // ---- layers ----

    pub fn add_layer(&mut self, name: impl Into<String>) -> usize {
        self.root.layers.push(Layer::new(name));
        self.root.layers.len() - 1
    }

    pub fn layers(&self) -> &[Layer] {
        &self.root.layers
    }

    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.root.layers.iter().position(|l| l.name == name)
    }

    pub fn set_layer_visible(&mut self, index: usize, visible: bool) {
        if let Some(layer) = self.root.layers.get_mut(index) {
            layer.visible = visible;
        }
    }

    /// Whether objects on `parent`'s layer are visible. Composite layers
    /// follow the board layer they are bound to.
    pub(crate) fn is_layer_visible(&self, parent: Parent) -> bool {
        let Parent::Layer { owner, index } = parent else {
            return true;
        };
        let layer = match owner {
            DataOwner::Board => self.root.layers.get(index),
            DataOwner::Subc(sid) => self.subcs.get(&sid).and_then(|s| s.data.layers.get(index)),
        };
        let Some(layer) = layer else {
            return false;
        };
        let bound_visible = layer
            .binding
            .and_then(|b| self.root.layers.get(b))
            .is_none_or(|l| l.visible);
        layer.visible && bound_visible
    }

    // ---- lookup ----

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.store.get(id)
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.store.get_mut(id)
    }

    pub fn subc(&self, id: ObjectId) -> Option<&Subc> {
        self.subcs.get(&id)
    }

    pub(crate) fn subc_mut(&mut self, id: ObjectId) -> Option<&mut Subc> {
        self.subcs.get_mut(&id)
    }

    pub fn subc_ids(&self) -> &[ObjectId] {
        &self.root.subcs
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.store.contains(id) || self.subcs.contains_key(&id)
    }

    pub fn kind_of(&self, id: ObjectId) -> Option<ObjectKind> {
        if let Some(obj) = self.store.get(id) {
            return Some(obj.kind());
        }
        self.subcs.contains_key(&id).then_some(ObjectKind::Composite)
    }

    /// Bounding box of any object or composite.
    pub fn bbox_of(&self, id: ObjectId) -> Option<BoundingBox> {
        match self.store.get(id) {
            Some(obj) => Some(obj.bbox()),
            None => self.subcs.get(&id).map(|s| s.bbox),
        }
    }

    /// The composite an object lives in, found through its parent chain.
    pub fn object_subc(&self, id: ObjectId) -> Option<ObjectId> {
        self.store.get(id)?.parent.subc()
    }

    /// Board-level objects and composites whose boxes intersect `area`.
    pub fn query(&self, area: &BoundingBox) -> Vec<ObjectId> {
        self.root
            .tree
            .as_ref()
            .map(|t| t.query(area))
            .unwrap_or_default()
    }

    /// Whether `id` is currently held by the spatial index of its container.
    pub fn is_indexed(&self, id: ObjectId) -> bool {
        let owner = match self.store.get(id) {
            Some(obj) => obj.parent.owner(),
            None => DataOwner::Board,
        };
        self.tree(owner).is_some_and(|t| t.contains(id))
    }

    // ---- construction ----

    /// Adds a primitive without recording it for undo.
    pub fn add_object(&mut self, parent: Parent, geo: Primitive) -> Result<ObjectId> {
        let id = self.store.alloc_id();
        self.insert_object(Object::new(id, parent, geo), None)?;
        Ok(id)
    }

    pub fn add_line(&mut self, layer: usize, line: Line) -> Result<ObjectId> {
        self.add_object(Self::board_layer(layer), Primitive::Line(line))
    }

    pub fn add_arc(&mut self, layer: usize, arc: Arc) -> Result<ObjectId> {
        self.add_object(Self::board_layer(layer), Primitive::Arc(arc))
    }

    pub fn add_text(&mut self, layer: usize, text: Text) -> Result<ObjectId> {
        self.add_object(Self::board_layer(layer), Primitive::Text(text))
    }

    pub fn add_polygon(&mut self, layer: usize, polygon: Polygon) -> Result<ObjectId> {
        self.add_object(Self::board_layer(layer), Primitive::Polygon(polygon))
    }

    pub fn add_graphic(&mut self, layer: usize, gfx: Graphic) -> Result<ObjectId> {
        self.add_object(Self::board_layer(layer), Primitive::Graphic(gfx))
    }

    pub fn add_padstack(&mut self, pstk: PadStack) -> Result<ObjectId> {
        self.add_object(Parent::Data(DataOwner::Board), Primitive::PadStack(pstk))
    }

    pub fn add_rat(&mut self, rat: RatLine) -> Result<ObjectId> {
        self.add_object(Parent::Data(DataOwner::Board), Primitive::Rat(rat))
    }

    fn board_layer(index: usize) -> Parent {
        Parent::Layer {
            owner: DataOwner::Board,
            index,
        }
    }

    /// Creates an empty composite with one layer per name, each bound to the
    /// board layer of the same name, and places it on the board.
    pub fn new_subc(&mut self, origin: Point, layer_names: &[&str]) -> ObjectId {
        let id = self.store.alloc_id();
        let mut subc = Subc::new(id, origin);
        subc.data.layers = layer_names.iter().map(|n| Layer::bound(*n, None)).collect();
        self.place_subc(subc, Vec::new(), None);
        id
    }

    pub fn flags_of(&self, id: ObjectId) -> Option<ObjectFlags> {
        match self.store.get(id) {
            Some(obj) => Some(obj.flags),
            None => self.subcs.get(&id).map(|s| s.flags),
        }
    }

    /// Overwrites the flags of an object or composite, returning the old ones.
    pub(crate) fn replace_flags(&mut self, id: ObjectId, flags: ObjectFlags) -> Option<ObjectFlags> {
        if let Some(obj) = self.store.get_mut(id) {
            return Some(std::mem::replace(&mut obj.flags, flags));
        }
        self.subcs
            .get_mut(&id)
            .map(|s| std::mem::replace(&mut s.flags, flags))
    }

    /// Sets or clears `flags` without recording the change.
    pub fn set_object_flags(&mut self, id: ObjectId, flags: ObjectFlags, on: bool) -> bool {
        if let Some(obj) = self.store.get_mut(id) {
            let before = obj.flags;
            obj.flags.set(flags, on);
            return before != obj.flags;
        }
        if let Some(subc) = self.subcs.get_mut(&id) {
            let before = subc.flags;
            subc.flags.set(flags, on);
            return before != subc.flags;
        }
        false
    }

    /// Sets or clears a composite attribute as one undo step and notifies the
    /// composite's extended object.
    pub fn set_subc_attribute(&mut self, id: ObjectId, key: &str, value: Option<&str>) -> bool {
        let Some(before) = self.swap_subc_attribute(id, key, value.map(str::to_string)) else {
            return false;
        };
        if before.as_deref() == value {
            return false;
        }
        self.undo.record(UndoOp::SubcAttr {
            id,
            key: key.to_string(),
            before,
        });
        self.extobj_attr_changed(id, key, value);
        self.undo.inc_serial();
        true
    }

    /// Replaces an attribute value, returning the previous one. `None` if the
    /// composite does not exist.
    pub(crate) fn swap_subc_attribute(
        &mut self,
        id: ObjectId,
        key: &str,
        value: Option<String>,
    ) -> Option<Option<String>> {
        let subc = self.subcs.get_mut(&id)?;
        let before = match &value {
            Some(v) => subc.attributes.insert(key.to_string(), v.clone()),
            None => subc.attributes.remove(key),
        };
        if key == EXTOBJ_ATTR && before != value {
            subc.extobj.set_name(value);
        }
        Some(before)
    }

    // ---- spatial bookkeeping ----

    pub(crate) fn tree(&self, owner: DataOwner) -> Option<&SpatialIndex> {
        match owner {
            DataOwner::Board => self.root.tree.as_ref(),
            DataOwner::Subc(sid) => self.subcs.get(&sid)?.data.tree.as_ref(),
        }
    }

    fn tree_mut(&mut self, owner: DataOwner) -> Option<&mut SpatialIndex> {
        match owner {
            DataOwner::Board => self.root.tree.as_mut(),
            DataOwner::Subc(sid) => self.subcs.get_mut(&sid)?.data.tree.as_mut(),
        }
    }

    fn data_mut(&mut self, owner: DataOwner) -> Option<&mut Data> {
        match owner {
            DataOwner::Board => Some(&mut self.root),
            DataOwner::Subc(sid) => Some(&mut self.subcs.get_mut(&sid)?.data),
        }
    }

    /// Removes an object from its container's index before its geometry changes.
    pub(crate) fn detach_object(&mut self, id: ObjectId) {
        let Some(owner) = self.store.get(id).map(|o| o.parent.owner()) else {
            return;
        };
        if let Some(tree) = self.tree_mut(owner) {
            tree.remove(id);
        }
    }

    /// Reinserts an object under its current box.
    pub(crate) fn attach_object(&mut self, id: ObjectId) {
        let Some((owner, bbox)) = self.store.get(id).map(|o| (o.parent.owner(), o.bbox())) else {
            return;
        };
        if let Some(tree) = self.tree_mut(owner) {
            tree.insert(id, bbox);
        }
    }

    pub(crate) fn detach_subc(&mut self, sid: ObjectId) {
        if let Some(tree) = self.root.tree.as_mut() {
            tree.remove(sid);
        }
    }

    /// Inserts the composite into the board index under its full box,
    /// replacing any entry a hook may already have put there.
    pub(crate) fn attach_subc(&mut self, sid: ObjectId) {
        let Some(bbox) = self.subcs.get(&sid).map(|s| s.bbox) else {
            return;
        };
        if let Some(tree) = self.root.tree.as_mut() {
            if tree.contains(sid) {
                tree.remove(sid);
            }
            tree.insert(sid, bbox);
        }
    }

    /// Recomputes a composite's boxes after one of its parts changed, or
    /// marks them dirty while recomputation is deferred.
    pub(crate) fn subc_part_changed(&mut self, sid: ObjectId) {
        let policy = self.options.floater_bbox;
        let Some(subc) = self.subcs.get_mut(&sid) else {
            return;
        };
        if subc.bbox_defer > 0 {
            subc.bbox_dirty = true;
            return;
        }
        subc.recompute_bbox(&self.store, policy);
        subc.bbox_dirty = false;
        self.attach_subc(sid);
    }

    /// Runs `f` as a regeneration of a composite's derived geometry.
    ///
    /// The composite is taken out of the board index, record creation is
    /// frozen, and afterwards the boxes are recomputed (or left dirty if an
    /// outer caller deferred them) before the composite is reinserted.
    pub fn regenerate<F>(&mut self, sid: ObjectId, f: F) -> std::result::Result<(), ExtObjError>
    where
        F: FnOnce(&mut Board) -> std::result::Result<(), ExtObjError>,
    {
        if !self.subcs.contains_key(&sid) {
            tracing::debug!(subc = %sid, "regenerate on missing composite");
            return Ok(());
        }
        let _add = self.undo.freeze_add();
        self.detach_subc(sid);
        if let Some(subc) = self.subcs.get_mut(&sid) {
            subc.bbox_defer += 1;
        }

        let result = f(self);

        let deferred = match self.subcs.get_mut(&sid) {
            Some(subc) => {
                subc.bbox_defer = subc.bbox_defer.saturating_sub(1);
                subc.bbox_defer > 0
            }
            None => return result,
        };
        if deferred {
            if let Some(subc) = self.subcs.get_mut(&sid) {
                subc.bbox_dirty = true;
            }
        } else {
            self.subc_part_changed(sid);
        }
        result
    }

    // ---- object insertion and removal ----

    /// Links an object into its parent list (at `slot` if given), the store
    /// and the spatial index.
    pub(crate) fn insert_object(&mut self, object: Object, slot: Option<usize>) -> Result<()> {
        let (id, parent, kind) = (object.id, object.parent, object.kind());
        let list = self
            .data_mut(parent.owner())
            .and_then(|d| d.list_mut(parent, kind))
            .ok_or_else(|| OperationError::InvalidParameter {
                param: "parent".to_string(),
                reason: format!("{parent:?} cannot hold a {kind}"),
            })?;
        match slot {
            Some(i) if i <= list.len() => list.insert(i, id),
            _ => list.push(id),
        }
        self.store.insert(object);
        self.attach_object(id);
        if let Some(sid) = parent.subc() {
            self.subc_part_changed(sid);
        }
        Ok(())
    }

    /// Unlinks an object, returning it with its position in the parent list.
    pub(crate) fn take_object(&mut self, id: ObjectId) -> Option<(Object, usize)> {
        let (parent, kind) = self.store.get(id).map(|o| (o.parent, o.kind()))?;
        self.detach_object(id);
        let slot = self
            .data_mut(parent.owner())
            .and_then(|d| d.list_mut(parent, kind))
            .and_then(|list| {
                let pos = list.iter().position(|e| *e == id)?;
                list.remove(pos);
                Some(pos)
            })
            .unwrap_or(0);
        let object = self.store.remove(id)?;
        if self.selection.primary() == Some(id) {
            self.selection.set_primary(None);
        }
        if let Some(sid) = parent.subc() {
            self.subc_part_changed(sid);
        }
        Some((object, slot))
    }

    /// Adds `object` under a fresh id and records its creation.
    pub(crate) fn create_object_recorded(&mut self, mut object: Object) -> Option<ObjectId> {
        object.id = self.store.alloc_id();
        object.editing = false;
        let id = object.id;
        if let Err(err) = self.insert_object(object, None) {
            tracing::warn!(error = %err, "object creation failed");
            return None;
        }
        self.undo.record(UndoOp::Create { id });
        Some(id)
    }

    /// Removes an object and records the removal.
    pub(crate) fn remove_object_recorded(&mut self, id: ObjectId) -> bool {
        let Some((object, slot)) = self.take_object(id) else {
            return false;
        };
        self.undo.record(UndoOp::Remove {
            removed: Removed::Object {
                object: Box::new(object),
                slot,
            },
        });
        true
    }

    // ---- composite placement ----

    /// Places a composite and its children on the board: binds its layers to
    /// board layers by name, builds its private index and inserts it into the
    /// board index.
    pub(crate) fn place_subc(&mut self, mut subc: Subc, children: Vec<Object>, slot: Option<usize>) {
        let id = subc.id;
        for layer in &mut subc.data.layers {
            if layer.binding.is_none() {
                layer.binding = self.root.layers.iter().position(|l| l.name == layer.name);
            }
        }
        let mut tree = SpatialIndex::new(self.options.cell_size);
        for child in children {
            tree.insert(child.id, child.bbox());
            self.store.insert(child);
        }
        subc.data.tree = Some(tree);
        subc.bbox_defer = 0;
        subc.recompute_bbox(&self.store, self.options.floater_bbox);
        subc.bbox_dirty = false;

        self.store.reserve(id);

        match slot {
            Some(i) if i <= self.root.subcs.len() => self.root.subcs.insert(i, id),
            _ => self.root.subcs.push(id),
        }
        self.subcs.insert(id, subc);
        self.attach_subc(id);
    }

    /// Unlinks a composite and its children, returning a snapshot and its
    /// position in the board's composite list.
    pub(crate) fn take_subc(&mut self, sid: ObjectId) -> Option<(SubcSnapshot, usize)> {
        let subc = self.subcs.get(&sid)?;
        let snapshot = SubcSnapshot::capture(subc, &self.store);
        let child_ids = subc.child_ids();

        self.detach_subc(sid);
        for id in child_ids {
            self.store.remove(id);
        }
        self.subcs.remove(&sid);
        let slot = match self.root.subcs.iter().position(|e| *e == sid) {
            Some(pos) => {
                self.root.subcs.remove(pos);
                pos
            }
            None => 0,
        };
        if self.selection.primary() == Some(sid) {
            self.selection.set_primary(None);
        }
        Some((snapshot, slot))
    }

    pub(crate) fn restore_subc(&mut self, snapshot: SubcSnapshot, slot: usize) -> ObjectId {
        let SubcSnapshot { subc, children } = snapshot;
        let id = subc.id;
        self.place_subc(subc, children, Some(slot));
        id
    }

    pub fn subc_snapshot(&self, sid: ObjectId) -> Option<SubcSnapshot> {
        self.subcs
            .get(&sid)
            .map(|s| SubcSnapshot::capture(s, &self.store))
    }

    /// Duplicates a composite under fresh ids, shifted by `(dx, dy)`, and
    /// records the creation.
    pub(crate) fn dup_subc(&mut self, sid: ObjectId, keep_floaters: bool, dx: Coord, dy: Coord) -> Option<ObjectId> {
        let snapshot = self.subc_snapshot(sid)?;
        let store = &mut self.store;
        let SubcSnapshot { mut subc, mut children } =
            snapshot.renumbered(keep_floaters, || store.alloc_id());
        for child in &mut children {
            child.geo.translate(dx, dy);
            child.flags.remove(ObjectFlags::SELECTED);
        }
        subc.origin = subc.origin.translated(dx, dy);
        let id = subc.id;
        self.place_subc(subc, children, None);
        self.undo.record(UndoOp::Create { id });
        Some(id)
    }

    /// Removes a composite as one recorded step, letting its extended object
    /// release its state first.
    pub(crate) fn remove_subc_recorded(&mut self, sid: ObjectId) -> bool {
        if !self.subcs.contains_key(&sid) {
            return false;
        }
        self.extobj_before_destroy(sid);
        let Some((snapshot, slot)) = self.take_subc(sid) else {
            return false;
        };
        self.undo.record(UndoOp::Remove {
            removed: Removed::Subc {
                snapshot: Box::new(snapshot),
                slot,
            },
        });
        true
    }

    /// Replaces a composite wholesale with a snapshot of the same id.
    pub(crate) fn replace_subc(&mut self, snapshot: SubcSnapshot) -> Option<SubcSnapshot> {
        let (current, slot) = self.take_subc(snapshot.id())?;
        self.restore_subc(snapshot, slot);
        Some(current)
    }

    /// Attribute map of an object or composite.
    pub fn attributes(&self, id: ObjectId) -> Option<&BTreeMap<String, String>> {
        match self.store.get(id) {
            Some(obj) => Some(&obj.attributes),
            None => self.subcs.get(&id).map(|s| &s.attributes),
        }
    }
}
