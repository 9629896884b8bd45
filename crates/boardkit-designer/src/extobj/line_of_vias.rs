//! `line-of-vias`: vias stitched at a fixed pitch along edit lines.
//!
//! The composite's first layer holds the edit lines as floaters; its
//! padstacks are derived and rebuilt from the lines on every edit.

use std::cell::RefCell;
use std::collections::HashMap;

use boardkit_core::{parse_coord, BoundingBox, Coord, ExtObjError, ObjectFlags, ObjectId, ObjectKind, Point};

use crate::board::{Board, DataOwner, Parent};
use crate::model::{Line, PadStack, Primitive};
use crate::object_store::Object;

use super::{ExtObject, FloatDel, FloatNew, HookSet};

pub const PITCH_ATTR: &str = "extobj::pitch";
pub const CLEARANCE_ATTR: &str = "extobj::clearance";
pub const ROLE_ATTR: &str = "extobj::role";

const EDIT_LAYER: usize = 0;
const DEFAULT_PITCH: Coord = 4_000_000;
const MIN_PITCH: Coord = 1_000;
const VIA_DIAMETER: Coord = 600_000;
const VIA_HOLE: Coord = 300_000;
/// Distance of the origin mark from the first line.
const AUX_UNIT: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Params {
    pitch: Coord,
    clearance: Coord,
}

#[derive(Debug, Default)]
pub struct LineOfVias {
    cache: RefCell<HashMap<ObjectId, Params>>,
}

impl LineOfVias {
    pub const NAME: &'static str = "line-of-vias";

    pub fn new() -> Self {
        Self::default()
    }

    fn params(&self, board: &Board, sid: ObjectId) -> Params {
        if let Some(p) = self.cache.borrow().get(&sid) {
            return *p;
        }
        let p = Self::unpack(board, sid);
        self.cache.borrow_mut().insert(sid, p);
        p
    }

    fn unpack(board: &Board, sid: ObjectId) -> Params {
        let attr = |key: &str| {
            board
                .subc(sid)
                .and_then(|s| s.attribute(key))
                .and_then(parse_coord)
        };
        Params {
            pitch: attr(PITCH_ATTR).unwrap_or(DEFAULT_PITCH),
            clearance: attr(CLEARANCE_ATTR).unwrap_or(0),
        }
    }

    fn edit_lines(board: &Board, sid: ObjectId) -> Vec<Line> {
        let Some(layer) = board.subc(sid).and_then(|s| s.data.layers.get(EDIT_LAYER)) else {
            return Vec::new();
        };
        layer
            .lines
            .iter()
            .filter_map(|id| board.object(*id))
            .filter(|o| o.is_floater())
            .filter_map(|o| o.geo.as_line().cloned())
            .collect()
    }

    fn remove_vias(board: &mut Board, sid: ObjectId) {
        let vias = board
            .subc(sid)
            .map(|s| s.data.padstacks.clone())
            .unwrap_or_default();
        for id in vias {
            if board.object(id).is_some_and(|o| !o.is_floater()) {
                board.take_object(id);
            }
        }
    }

    fn clear(board: &mut Board, sid: ObjectId) -> Result<(), ExtObjError> {
        board.regenerate(sid, |b| {
            Self::remove_vias(b, sid);
            Ok(())
        })
    }

    /// Whether a board-level via sits closer than half a pitch to `at`.
    fn too_close(board: &Board, at: Point, pitch: Coord) -> bool {
        let area = BoundingBox::at(at).bloated(pitch / 4);
        board.query(&area).into_iter().any(|id| {
            board.object(id).is_some_and(|o| {
                o.parent == Parent::Data(DataOwner::Board)
                    && o.geo
                        .as_padstack()
                        .is_some_and(|p| p.pos.distance_to(&at) < pitch as f64 / 2.0)
            })
        })
    }

    fn gen_line(board: &mut Board, sid: ObjectId, line: &Line, params: Params) -> Result<(), ExtObjError> {
        let len = line.length();
        let (dx, dy) = unit_vector(line, len);
        let pitch = params.pitch as f64;
        let (mut x, mut y) = (line.p1.x as f64, line.p1.y as f64);
        let mut offs = 0.0;
        while offs <= len {
            let at = Point::new(x.round() as Coord, y.round() as Coord);
            if !Self::too_close(board, at, params.pitch) {
                let via = PadStack::via(at, VIA_DIAMETER, VIA_HOLE).with_clearance(params.clearance);
                let id = board
                    .add_object(Parent::Data(DataOwner::Subc(sid)), Primitive::PadStack(via))
                    .map_err(|e| ExtObjError::declined(Self::NAME, e.to_string()))?;
                board.set_object_flags(id, ObjectFlags::CLEARLINE, true);
            }
            x += dx * pitch;
            y += dy * pitch;
            offs += pitch;
        }
        Ok(())
    }

    fn gen(&self, board: &mut Board, sid: ObjectId) -> Result<(), ExtObjError> {
        let params = self.params(board, sid);
        if params.pitch < MIN_PITCH {
            return Err(ExtObjError::declined(
                Self::NAME,
                format!("pitch {} is too small", params.pitch),
            ));
        }
        board.regenerate(sid, |b| {
            Self::remove_vias(b, sid);
            let lines = Self::edit_lines(b, sid);
            for line in &lines {
                Self::gen_line(b, sid, line, params)?;
            }
            if let (Some(first), Some(subc)) = (lines.first(), b.subc_mut(sid)) {
                let (dx, dy) = unit_vector(first, first.length());
                subc.origin = Point::new(
                    (first.p1.x as f64 - dy * AUX_UNIT).round() as Coord,
                    (first.p1.y as f64 + dx * AUX_UNIT).round() as Coord,
                );
            }
            Ok(())
        })
    }
}

fn unit_vector(line: &Line, len: f64) -> (f64, f64) {
    if len == 0.0 {
        return (0.0, 0.0);
    }
    (
        (line.p2.x - line.p1.x) as f64 / len,
        (line.p2.y - line.p1.y) as f64 / len,
    )
}

impl ExtObject for LineOfVias {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn hooks(&self) -> HookSet {
        HookSet::all()
    }

    fn float_pre(&self, board: &mut Board, subc: ObjectId, _floater: ObjectId) -> Result<(), ExtObjError> {
        Self::clear(board, subc)
    }

    fn float_geo(&self, board: &mut Board, subc: ObjectId, _floater: Option<ObjectId>) -> Result<(), ExtObjError> {
        self.gen(board, subc)
    }

    fn float_new(&self, _board: &Board, _subc: ObjectId, _floater: ObjectId) -> Result<FloatNew, ExtObjError> {
        Ok(FloatNew::Floater)
    }

    fn float_del(&self, board: &Board, subc: ObjectId, _floater: ObjectId) -> Result<FloatDel, ExtObjError> {
        // Removing the last edit line removes the whole composite.
        match Self::edit_lines(board, subc).len() {
            0 | 1 => Ok(FloatDel::RemoveSubc),
            _ => Ok(FloatDel::RemoveFloater),
        }
    }

    fn chg_attr(
        &self,
        board: &mut Board,
        subc: ObjectId,
        key: &str,
        _value: Option<&str>,
    ) -> Result<(), ExtObjError> {
        if !key.starts_with("extobj::") {
            return Ok(());
        }
        self.cache.borrow_mut().remove(&subc);
        self.gen(board, subc)
    }

    fn del_pre(&self, _board: &mut Board, subc: ObjectId) -> Result<(), ExtObjError> {
        self.cache.borrow_mut().remove(&subc);
        Ok(())
    }

    fn conv_objs(
        &self,
        board: &mut Board,
        dst: DataOwner,
        objs: &[ObjectId],
        copy_from: Option<ObjectId>,
    ) -> Result<ObjectId, ExtObjError> {
        let mut lines = Vec::with_capacity(objs.len());
        for id in objs {
            match board.object(*id) {
                Some(obj) if obj.kind() == ObjectKind::Line => lines.push(obj.snapshot()),
                _ => return Err(ExtObjError::declined(Self::NAME, format!("{id} is not a line"))),
            }
        }
        let Some(first) = lines.first() else {
            return Err(ExtObjError::declined(Self::NAME, "nothing to convert"));
        };
        let binding = match first.parent {
            Parent::Layer {
                owner: DataOwner::Board,
                index,
            } => Some(index),
            _ => None,
        };
        let origin = first.geo.point(0).unwrap_or_default();

        let sid = board.exto_create(dst, Self::NAME, &[("edit", binding)], origin, copy_from)?;
        if copy_from.is_none() {
            if let Some(subc) = board.subc_mut(sid) {
                subc.attributes.insert(PITCH_ATTR.to_string(), "4mm".to_string());
            }
        }

        for line in lines {
            let mut floater = Object::new(
                board.store.alloc_id(),
                Parent::Layer {
                    owner: DataOwner::Subc(sid),
                    index: EDIT_LAYER,
                },
                line.geo,
            );
            floater.attributes = line.attributes;
            floater.flags = (line.flags - ObjectFlags::SELECTED) | ObjectFlags::FLOATER;
            floater
                .attributes
                .insert(ROLE_ATTR.to_string(), "edit".to_string());
            board
                .insert_object(floater, None)
                .map_err(|e| ExtObjError::declined(Self::NAME, e.to_string()))?;
        }

        self.cache.borrow_mut().remove(&sid);
        if let Err(err) = self.gen(board, sid) {
            tracing::warn!(subc = %sid, error = %err, "initial via generation failed");
        }
        Ok(sid)
    }
}
