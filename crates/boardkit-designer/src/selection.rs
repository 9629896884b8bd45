use boardkit_core::{BoundingBox, ObjectFlags, ObjectId};

use crate::board::Board;

/// Tracks the primary selection.
///
/// The selection itself lives in each object's `SELECTED` flag, which is
/// what the selected-object walk reads. The manager only remembers which
/// object was picked last, the one a host shows properties for.
///
/// Selection changes are not undoable.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    primary: Option<ObjectId>,
}

impl SelectionManager {
    /// Creates a new `SelectionManager` with no selection.
    ///
    /// # Examples
    ///
    /// ```
    /// use boardkit_designer::selection::SelectionManager;
    ///
    /// let manager = SelectionManager::new();
    /// assert_eq!(manager.primary(), None);
    /// ```
    pub fn new() -> Self {
        Self { primary: None }
    }

    pub fn primary(&self) -> Option<ObjectId> {
        self.primary
    }

    /// Sets the primary selection without touching any flags.
    pub fn set_primary(&mut self, id: Option<ObjectId>) {
        self.primary = id;
    }
}

impl Board {
    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    /// Selects one object or composite.
    ///
    /// Selecting a composite flags its parts as well. Unless `multi` is set,
    /// everything else is deselected first. Returns `false` if `id` does not
    /// exist.
    pub fn select(&mut self, id: ObjectId, multi: bool) -> bool {
        if !self.contains(id) {
            return false;
        }
        if !multi {
            self.deselect_all();
        }
        self.flag_selected(id);
        self.selection.set_primary(Some(id));
        true
    }

    /// Selects every board-level object and composite whose box intersects
    /// `area` on a visible layer. Returns how many were selected.
    pub fn select_in_rect(&mut self, area: &BoundingBox, multi: bool) -> usize {
        if !multi {
            self.deselect_all();
        }
        let hits: Vec<ObjectId> = self
            .query(area)
            .into_iter()
            .filter(|id| match self.store.get(*id) {
                Some(obj) => self.is_layer_visible(obj.parent),
                None => true,
            })
            .collect();
        for id in &hits {
            self.flag_selected(*id);
        }
        if let Some(last) = hits.last() {
            self.selection.set_primary(Some(*last));
        }
        tracing::debug!(count = hits.len(), "rectangle selection");
        hits.len()
    }

    pub fn select_all(&mut self) {
        for obj in self.store.iter_mut() {
            obj.flags.insert(ObjectFlags::SELECTED);
        }
        for subc in self.subcs.values_mut() {
            subc.flags.insert(ObjectFlags::SELECTED);
        }
        self.selection.set_primary(self.root.subcs.last().copied());
    }

    pub fn deselect_all(&mut self) {
        for obj in self.store.iter_mut() {
            obj.flags.remove(ObjectFlags::SELECTED);
        }
        for subc in self.subcs.values_mut() {
            subc.flags.remove(ObjectFlags::SELECTED);
        }
        self.selection.set_primary(None);
    }

    /// Selected objects and composites, in id order.
    pub fn selected_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self
            .store
            .iter()
            .filter(|o| o.is_selected())
            .map(|o| o.id)
            .chain(self.subcs.values().filter(|s| s.is_selected()).map(|s| s.id))
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn selected_count(&self) -> usize {
        self.selected_ids().len()
    }

    fn flag_selected(&mut self, id: ObjectId) {
        if let Some(obj) = self.store.get_mut(id) {
            obj.flags.insert(ObjectFlags::SELECTED);
            return;
        }
        let Some(subc) = self.subcs.get_mut(&id) else {
            return;
        };
        subc.flags.insert(ObjectFlags::SELECTED);
        for child in subc.child_ids() {
            if let Some(obj) = self.store.get_mut(child) {
                obj.flags.insert(ObjectFlags::SELECTED);
            }
        }
    }
}
