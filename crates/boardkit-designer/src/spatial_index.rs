//! Spatial index
//!
//! Grid-bucketed container mapping object boxes to ids. Supports
//! insertion, removal by identity and box-range queries. Boxes spanning too
//! many cells are kept in a separate list that every query scans.

use std::collections::HashMap;

use boardkit_core::{BoundingBox, Coord, ObjectId};
use smallvec::SmallVec;

/// Above this many cells an entry goes to the oversized list.
const MAX_CELLS_PER_ENTRY: i64 = 1024;

type Cell = (i64, i64);

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: Coord,
    grid: HashMap<Cell, SmallVec<[ObjectId; 4]>>,
    oversized: Vec<ObjectId>,
    boxes: HashMap<ObjectId, BoundingBox>,
}

impl SpatialIndex {
    pub fn new(cell_size: Coord) -> Self {
        Self {
            cell_size: cell_size.max(1),
            grid: HashMap::new(),
            oversized: Vec::new(),
            boxes: HashMap::new(),
        }
    }

    fn cell_of(&self, x: Coord, y: Coord) -> Cell {
        (x.div_euclid(self.cell_size), y.div_euclid(self.cell_size))
    }

    fn cell_range(&self, bbox: &BoundingBox) -> (Cell, Cell) {
        (self.cell_of(bbox.x1, bbox.y1), self.cell_of(bbox.x2, bbox.y2))
    }

    fn is_oversized(lo: Cell, hi: Cell) -> bool {
        let w = hi.0.saturating_sub(lo.0).saturating_add(1);
        let h = hi.1.saturating_sub(lo.1).saturating_add(1);
        w.saturating_mul(h) > MAX_CELLS_PER_ENTRY
    }

    /// Inserts `id` with `bbox`. Returns `false` and leaves the index
    /// untouched if `id` is already present.
    pub fn insert(&mut self, id: ObjectId, bbox: BoundingBox) -> bool {
        if self.boxes.contains_key(&id) {
            return false;
        }
        if !bbox.is_empty() {
            let (lo, hi) = self.cell_range(&bbox);
            if Self::is_oversized(lo, hi) {
                self.oversized.push(id);
            } else {
                for gx in lo.0..=hi.0 {
                    for gy in lo.1..=hi.1 {
                        self.grid.entry((gx, gy)).or_default().push(id);
                    }
                }
            }
        }
        self.boxes.insert(id, bbox);
        tracing::trace!(%id, "spatial insert");
        true
    }

    /// Removes `id`, returning the box it was stored with.
    pub fn remove(&mut self, id: ObjectId) -> Option<BoundingBox> {
        let bbox = self.boxes.remove(&id)?;
        if !bbox.is_empty() {
            let (lo, hi) = self.cell_range(&bbox);
            if Self::is_oversized(lo, hi) {
                self.oversized.retain(|e| *e != id);
            } else {
                for gx in lo.0..=hi.0 {
                    for gy in lo.1..=hi.1 {
                        if let Some(bucket) = self.grid.get_mut(&(gx, gy)) {
                            bucket.retain(|e| *e != id);
                            if bucket.is_empty() {
                                self.grid.remove(&(gx, gy));
                            }
                        }
                    }
                }
            }
        }
        tracing::trace!(%id, "spatial remove");
        Some(bbox)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.boxes.contains_key(&id)
    }

    pub fn get_bbox(&self, id: ObjectId) -> Option<&BoundingBox> {
        self.boxes.get(&id)
    }

    /// All ids whose stored box intersects `area`, in ascending id order.
    pub fn query(&self, area: &BoundingBox) -> Vec<ObjectId> {
        if area.is_empty() {
            return Vec::new();
        }
        let mut result: Vec<ObjectId> = Vec::new();
        let hit = |id: &ObjectId| self.boxes.get(id).is_some_and(|b| b.intersects(area));

        let (lo, hi) = self.cell_range(area);
        if Self::is_oversized(lo, hi) {
            result.extend(self.boxes.keys().copied().filter(|id| hit(id)));
        } else {
            for gx in lo.0..=hi.0 {
                for gy in lo.1..=hi.1 {
                    if let Some(bucket) = self.grid.get(&(gx, gy)) {
                        result.extend(bucket.iter().copied().filter(|id| hit(id)));
                    }
                }
            }
            result.extend(self.oversized.iter().copied().filter(|id| hit(id)));
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn clear(&mut self) {
        self.grid.clear();
        self.oversized.clear();
        self.boxes.clear();
    }
}
