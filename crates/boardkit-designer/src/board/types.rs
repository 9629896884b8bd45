//! Board type definitions: DataOwner, Parent, Data, Layer.

use boardkit_core::{ObjectId, ObjectKind};
use serde::{Deserialize, Serialize};

use crate::spatial_index::SpatialIndex;

/// Who owns a [`Data`] container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataOwner {
    Board,
    Subc(ObjectId),
}

/// Back-reference from an object to its container.
///
/// Layer objects (lines, arcs, texts, polygons, graphics) point at a layer;
/// padstacks and rat lines point at the data container directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parent {
    Layer { owner: DataOwner, index: usize },
    Data(DataOwner),
}

impl Parent {
    pub fn owner(&self) -> DataOwner {
        match *self {
            Parent::Layer { owner, .. } => owner,
            Parent::Data(owner) => owner,
        }
    }

    /// The composite this parent belongs to, if any.
    pub fn subc(&self) -> Option<ObjectId> {
        match self.owner() {
            DataOwner::Subc(id) => Some(id),
            DataOwner::Board => None,
        }
    }

    pub fn layer_index(&self) -> Option<usize> {
        match *self {
            Parent::Layer { index, .. } => Some(index),
            Parent::Data(_) => None,
        }
    }
}

/// A layer and the ids of the objects drawn on it, in drawing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub visible: bool,
    /// For composite layers: index of the board layer this one maps to.
    pub binding: Option<usize>,
    pub lines: Vec<ObjectId>,
    pub arcs: Vec<ObjectId>,
    pub texts: Vec<ObjectId>,
    pub polygons: Vec<ObjectId>,
    pub gfxs: Vec<ObjectId>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            ..Default::default()
        }
    }

    pub fn bound(name: impl Into<String>, binding: Option<usize>) -> Self {
        Self {
            binding,
            ..Self::new(name)
        }
    }

    pub fn list(&self, kind: ObjectKind) -> &[ObjectId] {
        match kind {
            ObjectKind::Line => &self.lines,
            ObjectKind::Arc => &self.arcs,
            ObjectKind::Text => &self.texts,
            ObjectKind::Polygon => &self.polygons,
            ObjectKind::Graphic => &self.gfxs,
            _ => &[],
        }
    }

    pub fn list_mut(&mut self, kind: ObjectKind) -> Option<&mut Vec<ObjectId>> {
        match kind {
            ObjectKind::Line => Some(&mut self.lines),
            ObjectKind::Arc => Some(&mut self.arcs),
            ObjectKind::Text => Some(&mut self.texts),
            ObjectKind::Polygon => Some(&mut self.polygons),
            ObjectKind::Graphic => Some(&mut self.gfxs),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        ObjectKind::LAYER_KINDS.iter().all(|k| self.list(*k).is_empty())
    }
}

/// A container of layers, padstacks, rat lines and composites.
///
/// The board root and every placed composite own one. `tree` indexes every
/// direct member by bounding box; it is `None` while a composite is not
/// placed on a board.
#[derive(Debug, Clone, Default)]
pub struct Data {
    pub layers: Vec<Layer>,
    pub padstacks: Vec<ObjectId>,
    pub rats: Vec<ObjectId>,
    pub subcs: Vec<ObjectId>,
    pub tree: Option<SpatialIndex>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ordered id list an object of `kind` under `parent` belongs to.
    pub fn list_mut(&mut self, parent: Parent, kind: ObjectKind) -> Option<&mut Vec<ObjectId>> {
        match parent {
            Parent::Layer { index, .. } => self.layers.get_mut(index)?.list_mut(kind),
            Parent::Data(_) => match kind {
                ObjectKind::PadStack => Some(&mut self.padstacks),
                ObjectKind::RatLine => Some(&mut self.rats),
                _ => None,
            },
        }
    }

    /// Every primitive id, layer by layer in walk order, then padstacks and rats.
    pub fn object_ids(&self) -> Vec<(ObjectKind, ObjectId)> {
        let mut ids = Vec::new();
        for layer in &self.layers {
            for kind in ObjectKind::LAYER_KINDS {
                ids.extend(layer.list(kind).iter().map(|id| (kind, *id)));
            }
        }
        ids.extend(self.padstacks.iter().map(|id| (ObjectKind::PadStack, *id)));
        ids.extend(self.rats.iter().map(|id| (ObjectKind::RatLine, *id)));
        ids
    }
}
