//! Composite objects ("subcircuits").
//!
//! A composite owns its own [`Data`]: bound layers, padstacks and a private
//! spatial index of its children. The board index holds the composite itself
//! under its full bounding box.

pub mod executor;

pub use executor::UndoMode;

use std::collections::BTreeMap;

use boardkit_core::{BoundingBox, FloaterBboxPolicy, ObjectFlags, ObjectId, Point};

use crate::board::{Data, DataOwner, Parent};
use crate::extobj::ExtObjLink;
use crate::object_store::{Object, ObjectStore};

#[derive(Debug, Clone)]
pub struct Subc {
    pub id: ObjectId,
    pub flags: ObjectFlags,
    pub attributes: BTreeMap<String, String>,
    pub origin: Point,
    pub data: Data,
    pub extobj: ExtObjLink,
    pub(crate) bbox: BoundingBox,
    pub(crate) bbox_naked: BoundingBox,
    /// While positive, bounding box recomputation is postponed.
    pub(crate) bbox_defer: u32,
    pub(crate) bbox_dirty: bool,
}

impl Subc {
    pub fn new(id: ObjectId, origin: Point) -> Self {
        Self {
            id,
            flags: ObjectFlags::empty(),
            attributes: BTreeMap::new(),
            origin,
            data: Data::new(),
            extobj: ExtObjLink::default(),
            bbox: BoundingBox::at(origin),
            bbox_naked: BoundingBox::at(origin),
            bbox_defer: 0,
            bbox_dirty: false,
        }
    }

    /// Full bounding box.
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Bounding box without floaters.
    pub fn bbox_naked(&self) -> BoundingBox {
        self.bbox_naked
    }

    pub fn is_bbox_dirty(&self) -> bool {
        self.bbox_dirty
    }

    pub fn is_selected(&self) -> bool {
        self.flags.contains(ObjectFlags::SELECTED)
    }

    pub fn is_locked(&self) -> bool {
        self.flags.contains(ObjectFlags::LOCK)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Ids of every child, in walk order.
    pub fn child_ids(&self) -> Vec<ObjectId> {
        self.data.object_ids().into_iter().map(|(_, id)| id).collect()
    }

    /// Recomputes both boxes from the live children.
    ///
    /// Floaters never count towards the naked box; `policy` decides whether
    /// they count towards the full one. A composite without contributing
    /// children collapses to its origin.
    pub fn recompute_bbox(&mut self, store: &ObjectStore, policy: FloaterBboxPolicy) {
        self.bbox = BoundingBox::inverted();
        self.bbox_naked = BoundingBox::inverted();
        for id in self.child_ids() {
            let Some(obj) = store.get(id) else {
                continue;
            };
            self.bump_child(obj, policy);
        }
        self.close_bbox();
    }

    pub(crate) fn bump_child(&mut self, obj: &Object, policy: FloaterBboxPolicy) {
        let b = obj.bbox();
        if obj.is_floater() {
            if policy == FloaterBboxPolicy::IncludeInFull {
                self.bbox.bump(&b);
            }
        } else {
            self.bbox.bump(&b);
            self.bbox_naked.bump(&b);
        }
    }

    pub(crate) fn close_bbox(&mut self) {
        self.bbox.close(self.origin);
        self.bbox_naked.close(self.origin);
    }
}

/// Detached copy of a composite and its children.
#[derive(Debug, Clone)]
pub struct SubcSnapshot {
    pub subc: Subc,
    pub children: Vec<Object>,
}

impl SubcSnapshot {
    pub fn capture(subc: &Subc, store: &ObjectStore) -> Self {
        let mut copy = subc.clone();
        copy.data.tree = None;
        copy.bbox_defer = 0;
        copy.extobj = subc.extobj.fresh();
        let children = subc
            .child_ids()
            .into_iter()
            .filter_map(|id| store.get(id).map(Object::snapshot))
            .collect();
        Self {
            subc: copy,
            children,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.subc.id
    }

    /// Renumbers the composite and its children with ids from `alloc`.
    ///
    /// Floaters are left out unless `keep_floaters` is set.
    pub fn renumbered(mut self, keep_floaters: bool, mut alloc: impl FnMut() -> ObjectId) -> Self {
        let new_id = alloc();
        let mut map = BTreeMap::new();
        let mut children = Vec::with_capacity(self.children.len());
        for mut child in self.children {
            if child.is_floater() && !keep_floaters {
                continue;
            }
            let fresh = alloc();
            map.insert(child.id, fresh);
            child.id = fresh;
            child.parent = match child.parent {
                Parent::Layer { index, .. } => Parent::Layer {
                    owner: DataOwner::Subc(new_id),
                    index,
                },
                Parent::Data(_) => Parent::Data(DataOwner::Subc(new_id)),
            };
            children.push(child);
        }

        let remap = |ids: &mut Vec<ObjectId>| {
            *ids = ids.iter().filter_map(|id| map.get(id).copied()).collect();
        };
        for layer in &mut self.subc.data.layers {
            remap(&mut layer.lines);
            remap(&mut layer.arcs);
            remap(&mut layer.texts);
            remap(&mut layer.polygons);
            remap(&mut layer.gfxs);
        }
        remap(&mut self.subc.data.padstacks);
        remap(&mut self.subc.data.rats);

        self.subc.id = new_id;
        self.subc.flags.remove(ObjectFlags::SELECTED);
        self.children = children;
        self
    }
}
