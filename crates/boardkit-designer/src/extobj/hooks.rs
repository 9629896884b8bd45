//! Board-side half of the extended-object protocol.
//!
//! Every hook failure is a "declined": it is logged and the board falls back
//! to ordinary behavior for that call.

use std::rc::Rc;

use boardkit_core::{ExtObjError, ObjectFlags, ObjectId, Point};

use crate::board::{Board, DataOwner, Layer, Parent};
use crate::subc::Subc;
use crate::undo::UndoOp;

use super::{ExtObject, FloatDel, FloatNew, HookSet, EXTOBJ_ATTR};

/// Pairs a `pre_edit` with its `post_edit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditToken {
    pub(crate) subc: ObjectId,
    pub(crate) floater: ObjectId,
}

impl EditToken {
    pub fn subc(&self) -> ObjectId {
        self.subc
    }

    pub fn floater(&self) -> ObjectId {
        self.floater
    }
}

impl Board {
    /// The descriptor a composite is linked to, if it resolves.
    pub fn extobj_descriptor(&self, sid: ObjectId) -> Option<Rc<dyn ExtObject>> {
        let subc = self.subcs.get(&sid)?;
        self.extobj.resolve(&subc.extobj)
    }

    fn floater_descriptor(&self, floater: ObjectId) -> Option<(ObjectId, Rc<dyn ExtObject>)> {
        let obj = self.store.get(floater)?;
        if !obj.is_floater() {
            return None;
        }
        let sid = obj.parent.subc()?;
        Some((sid, self.extobj_descriptor(sid)?))
    }

    fn set_editing(&mut self, id: ObjectId, on: bool) {
        if let Some(obj) = self.store.get_mut(id) {
            obj.editing = on;
        }
    }

    /// Announces an edit of `floater` to its composite's extended object.
    ///
    /// Returns a token only if `float_pre` ran; an object already inside an
    /// edit pair is not announced twice.
    pub fn extobj_pre_edit(&mut self, floater: ObjectId) -> Option<EditToken> {
        if !self.options.regenerate_on_edit || self.store.get(floater)?.is_editing() {
            return None;
        }
        let (sid, descriptor) = self.floater_descriptor(floater)?;
        if !descriptor.hooks().contains(HookSet::FLOAT_PRE) {
            return None;
        }

        self.set_editing(floater, true);
        if let Err(err) = descriptor.float_pre(self, sid, floater) {
            tracing::warn!(subc = %sid, floater = %floater, error = %err, "float_pre declined");
            self.set_editing(floater, false);
            return None;
        }
        tracing::debug!(subc = %sid, floater = %floater, extobj = descriptor.name(), "floater edit begins");
        Some(EditToken { subc: sid, floater })
    }

    /// Closes an edit pair and lets the extended object regenerate.
    ///
    /// `result` is the object the edit produced; it is passed on only while
    /// it still lives in the same composite.
    pub fn extobj_post_edit(&mut self, token: EditToken, result: Option<ObjectId>) {
        self.set_editing(token.floater, false);
        if !self.subcs.contains_key(&token.subc) {
            tracing::debug!(subc = %token.subc, "composite gone before post-edit");
            return;
        }
        let Some(descriptor) = self.extobj_descriptor(token.subc) else {
            return;
        };
        if !descriptor.hooks().contains(HookSet::FLOAT_GEO) {
            return;
        }
        let floater = result.filter(|id| {
            self.store
                .get(*id)
                .is_some_and(|o| o.parent.subc() == Some(token.subc))
        });
        if let Err(err) = descriptor.float_geo(self, token.subc, floater) {
            tracing::warn!(subc = %token.subc, error = %err, "float_geo declined");
        }
    }

    /// Full regeneration of a linked composite from its current floaters.
    pub(crate) fn extobj_regenerate(&mut self, sid: ObjectId) {
        let Some(descriptor) = self.extobj_descriptor(sid) else {
            return;
        };
        let floater = self.subcs.get(&sid).and_then(|s| {
            s.child_ids()
                .into_iter()
                .find(|id| self.store.get(*id).is_some_and(|o| o.is_floater()))
        });
        let hooks = descriptor.hooks();
        if let (true, Some(f)) = (hooks.contains(HookSet::FLOAT_PRE), floater) {
            if let Err(err) = descriptor.float_pre(self, sid, f) {
                tracing::warn!(subc = %sid, error = %err, "float_pre declined");
            }
        }
        if hooks.contains(HookSet::FLOAT_GEO) {
            if let Err(err) = descriptor.float_geo(self, sid, floater) {
                tracing::warn!(subc = %sid, error = %err, "float_geo declined");
            }
        }
    }

    /// Decides the fate of a floater that an edit created as a by-product.
    ///
    /// Returns the id the new floater ends up with; on spawn it lives in a
    /// fresh duplicate of its composite.
    pub fn extobj_float_new(&mut self, new: ObjectId) -> Option<ObjectId> {
        if !self.options.regenerate_on_edit {
            return Some(new);
        }
        let (sid, descriptor) = self.floater_descriptor(new)?;
        if !descriptor.hooks().contains(HookSet::FLOAT_NEW) {
            return Some(new);
        }
        match descriptor.float_new(self, sid, new) {
            Ok(FloatNew::Floater) => Some(new),
            Ok(FloatNew::Spawn) => self.spawn_subc_for(sid, new),
            Err(err) => {
                tracing::warn!(subc = %sid, floater = %new, error = %err, "float_new declined");
                Some(new)
            }
        }
    }

    fn spawn_subc_for(&mut self, sid: ObjectId, floater: ObjectId) -> Option<ObjectId> {
        let mut object = self.store.get(floater)?.snapshot();
        self.remove_object_recorded(floater);
        let dup = self.dup_subc(sid, false, 0, 0)?;
        object.parent = match object.parent {
            Parent::Layer { index, .. } => Parent::Layer {
                owner: DataOwner::Subc(dup),
                index,
            },
            Parent::Data(_) => Parent::Data(DataOwner::Subc(dup)),
        };
        let moved = self.create_object_recorded(object)?;
        tracing::debug!(subc = %sid, spawned = %dup, floater = %moved, "floater spawned its own composite");
        self.extobj_regenerate(sid);
        self.extobj_regenerate(dup);
        Some(moved)
    }

    /// How a deletion request for `floater` must be honoured.
    pub fn extobj_float_del(&mut self, floater: ObjectId) -> FloatDel {
        if !self.options.regenerate_on_edit {
            return FloatDel::RemoveFloater;
        }
        let Some((sid, descriptor)) = self.floater_descriptor(floater) else {
            return FloatDel::RemoveFloater;
        };
        if !descriptor.hooks().contains(HookSet::FLOAT_DEL) {
            return FloatDel::RemoveSubc;
        }
        descriptor.float_del(self, sid, floater).unwrap_or_else(|err| {
            tracing::warn!(subc = %sid, floater = %floater, error = %err, "float_del declined");
            FloatDel::RemoveFloater
        })
    }

    /// Fans an attribute change out to the composite's extended object.
    pub fn extobj_attr_changed(&mut self, sid: ObjectId, key: &str, value: Option<&str>) {
        if !self.options.regenerate_on_edit {
            return;
        }
        let Some(descriptor) = self.extobj_descriptor(sid) else {
            return;
        };
        if !descriptor.hooks().contains(HookSet::CHG_ATTR) {
            return;
        }
        if let Err(err) = descriptor.chg_attr(self, sid, key, value) {
            tracing::warn!(subc = %sid, key, error = %err, "chg_attr declined");
        }
    }

    /// Lets the extended object release its state before `sid` is freed.
    pub fn extobj_before_destroy(&mut self, sid: ObjectId) {
        let Some(descriptor) = self.extobj_descriptor(sid) else {
            return;
        };
        if !descriptor.hooks().contains(HookSet::DEL_PRE) {
            return;
        }
        if let Err(err) = descriptor.del_pre(self, sid) {
            tracing::warn!(subc = %sid, error = %err, "del_pre declined");
        }
    }

    /// Converts plain objects into a new composite of extended object `name`.
    ///
    /// Creation and the removal of the originals form one undo step. If the
    /// extended object declines, anything it created is removed again and
    /// leaves no undo record.
    pub fn extobj_convert(
        &mut self,
        name: &str,
        dst: DataOwner,
        objs: &[ObjectId],
        remove_originals: bool,
    ) -> Option<ObjectId> {
        let span = tracing::debug_span!("convert", extobj = name, board = %self.id());
        let _enter = span.enter();

        let Some(descriptor) = self.extobj.lookup(name) else {
            tracing::warn!(extobj = name, "no such extended object");
            return None;
        };
        if !descriptor.hooks().contains(HookSet::CONV_OBJS) {
            tracing::debug!(extobj = name, "extended object does not convert");
            return None;
        }

        let mark = self.undo.records().len();
        let serial_guard = self.undo.freeze_serial();
        let created = match descriptor.conv_objs(self, dst, objs, None) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(extobj = name, error = %err, "conversion declined");
                // Back out whatever the descriptor built before declining.
                let partial = self.undo.take_since(mark);
                if !partial.is_empty() {
                    tracing::debug!(
                        extobj = name,
                        records = partial.len(),
                        "rolling back partial conversion"
                    );
                    self.replay(partial);
                }
                return None;
            }
        };
        if remove_originals {
            for id in objs {
                self.remove_object_recorded(*id);
            }
        }
        drop(serial_guard);
        self.undo.inc_serial();
        tracing::debug!(extobj = name, subc = %created, "objects converted");
        Some(created)
    }

    /// Creates and places an empty, locked composite linked to `name`.
    ///
    /// `layers` are `(name, binding)` pairs; an unbound layer is bound to the
    /// board layer of the same name. Attributes are copied from `copy_from`
    /// when given.
    pub fn exto_create(
        &mut self,
        dst: DataOwner,
        name: &str,
        layers: &[(&str, Option<usize>)],
        origin: Point,
        copy_from: Option<ObjectId>,
    ) -> Result<ObjectId, ExtObjError> {
        if dst != DataOwner::Board {
            return Err(ExtObjError::declined(
                name,
                "composites can only be placed on the board",
            ));
        }
        let id = self.store.alloc_id();
        let mut subc = Subc::new(id, origin);
        subc.flags.insert(ObjectFlags::LOCK);
        if let Some(src) = copy_from.and_then(|s| self.subcs.get(&s)) {
            subc.attributes = src.attributes.clone();
        }
        subc.attributes.insert(EXTOBJ_ATTR.to_string(), name.to_string());
        subc.extobj.set_name(Some(name.to_string()));
        subc.data.layers = layers
            .iter()
            .map(|(layer, binding)| Layer::bound(*layer, *binding))
            .collect();

        self.place_subc(subc, Vec::new(), None);
        self.undo.record(UndoOp::Create { id });
        Ok(id)
    }
}
