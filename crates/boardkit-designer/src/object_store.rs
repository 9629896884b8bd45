//! Arena of primitive objects keyed by [`ObjectId`].

use std::collections::{BTreeMap, HashMap};

use boardkit_core::{BoundingBox, ObjectFlags, ObjectId, ObjectKind};
use serde::{Deserialize, Serialize};

use crate::board::Parent;
use crate::model::{Geometry, Primitive};

/// A primitive placed in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub id: ObjectId,
    pub flags: ObjectFlags,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub parent: Parent,
    pub geo: Primitive,
    /// Set between an extended-object pre-edit and its matching post-edit.
    #[serde(skip)]
    pub(crate) editing: bool,
}

impl Object {
    pub fn new(id: ObjectId, parent: Parent, geo: Primitive) -> Self {
        Self {
            id,
            flags: ObjectFlags::empty(),
            attributes: BTreeMap::new(),
            parent,
            geo,
            editing: false,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.geo.kind()
    }

    pub fn bbox(&self) -> BoundingBox {
        self.geo.bbox()
    }

    pub fn is_selected(&self) -> bool {
        self.flags.contains(ObjectFlags::SELECTED)
    }

    pub fn is_locked(&self) -> bool {
        self.flags.contains(ObjectFlags::LOCK)
    }

    pub fn is_floater(&self) -> bool {
        self.flags.contains(ObjectFlags::FLOATER)
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Copy suitable for an undo record.
    pub(crate) fn snapshot(&self) -> Object {
        let mut copy = self.clone();
        copy.editing = false;
        copy
    }
}

/// Owns every primitive of a board, including composite children.
///
/// Ids come from a single monotonic counter shared with composites and are
/// never handed out twice.
#[derive(Debug, Clone, Default)]
pub struct ObjectStore {
    objects: HashMap<ObjectId, Object>,
    next_id: u64,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            next_id: 1,
        }
    }

    /// Allocates a fresh id.
    pub fn alloc_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    pub fn insert(&mut self, object: Object) {
        self.reserve(object.id);
        self.objects.insert(object.id, object);
    }

    /// Keeps the counter ahead of an id restored from a snapshot.
    pub(crate) fn reserve(&mut self, id: ObjectId) {
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<Object> {
        self.objects.remove(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.objects.values_mut()
    }
}
