//! Extended objects
//!
//! An extended object is a behavior registered under a unique name and bound
//! to composites through their `extobj` link. It is told about edits to the
//! composite's floaters and regenerates derived geometry in response.
//!
//! Descriptors live in an [`ExtObjRegistry`] slot arena. Every slot carries a
//! generation so a handle cached on a composite is detected as stale in O(1)
//! once its slot is vacated or reused; a registry-wide generation counter is
//! bumped on every register/unregister so failed lookups are retried at most
//! once per registry change.

mod hooks;
pub mod line_of_vias;

pub use hooks::EditToken;
pub use line_of_vias::LineOfVias;

use std::cell::Cell;
use std::fmt;
use std::num::NonZeroU32;
use std::rc::Rc;

use bitflags::bitflags;
use boardkit_core::{ExtObjError, ObjectId};

use crate::board::{Board, DataOwner};

/// Attribute key naming a composite's extended object.
pub const EXTOBJ_ATTR: &str = "extobj";

bitflags! {
    /// The callbacks a descriptor implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HookSet: u8 {
        const FLOAT_PRE = 1 << 0;
        const FLOAT_GEO = 1 << 1;
        const FLOAT_NEW = 1 << 2;
        const FLOAT_DEL = 1 << 3;
        const CHG_ATTR = 1 << 4;
        const DEL_PRE = 1 << 5;
        const CONV_OBJS = 1 << 6;
    }
}

/// What to do with a floater created as a by-product of an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatNew {
    /// Keep it as a floater of the same composite.
    Floater,
    /// Give it its own copy of the composite.
    Spawn,
}

/// How a floater deletion request is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatDel {
    NoOp,
    RemoveFloater,
    RemoveSubc,
}

/// Callbacks of an extended object.
///
/// Only the callbacks listed in [`ExtObject::hooks`] are ever invoked.
/// Returning an error means "declined": the caller logs it and carries on
/// with the ordinary behavior.
pub trait ExtObject: fmt::Debug {
    fn name(&self) -> &str;

    fn hooks(&self) -> HookSet;

    /// Called before a floater is edited. Must not delete the floater.
    fn float_pre(&self, _board: &mut Board, _subc: ObjectId, _floater: ObjectId) -> Result<(), ExtObjError> {
        Ok(())
    }

    /// Regenerates derived geometry. `floater` is `None` when the edited
    /// floater no longer exists.
    fn float_geo(
        &self,
        _board: &mut Board,
        _subc: ObjectId,
        _floater: Option<ObjectId>,
    ) -> Result<(), ExtObjError> {
        Ok(())
    }

    fn float_new(&self, _board: &Board, _subc: ObjectId, _floater: ObjectId) -> Result<FloatNew, ExtObjError> {
        Ok(FloatNew::Floater)
    }

    fn float_del(&self, _board: &Board, _subc: ObjectId, _floater: ObjectId) -> Result<FloatDel, ExtObjError> {
        Ok(FloatDel::RemoveSubc)
    }

    fn chg_attr(
        &self,
        _board: &mut Board,
        _subc: ObjectId,
        _key: &str,
        _value: Option<&str>,
    ) -> Result<(), ExtObjError> {
        Ok(())
    }

    /// Called once before the composite is destroyed.
    fn del_pre(&self, _board: &mut Board, _subc: ObjectId) -> Result<(), ExtObjError> {
        Ok(())
    }

    /// Builds a new composite out of `objs` and returns its id.
    fn conv_objs(
        &self,
        _board: &mut Board,
        _dst: DataOwner,
        _objs: &[ObjectId],
        _copy_from: Option<ObjectId>,
    ) -> Result<ObjectId, ExtObjError> {
        Err(ExtObjError::declined(self.name(), "conversion not supported"))
    }
}

/// Stable reference to a registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtObjHandle {
    index: NonZeroU32,
    generation: u32,
}

impl ExtObjHandle {
    pub fn index(&self) -> NonZeroU32 {
        self.index
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    descriptor: Option<Rc<dyn ExtObject>>,
}

#[derive(Debug, Default)]
pub struct ExtObjRegistry {
    slots: Vec<Slot>,
    generation: u64,
}

impl ExtObjRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped on every register and unregister.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn register(&mut self, descriptor: Rc<dyn ExtObject>) -> Result<ExtObjHandle, ExtObjError> {
        let name = descriptor.name().to_string();
        if self.handle_of(&name).is_some() {
            return Err(ExtObjError::DuplicateName { name });
        }

        let pos = match self.slots.iter().position(|s| s.descriptor.is_none()) {
            Some(pos) => {
                let slot = &mut self.slots[pos];
                slot.generation = slot.generation.wrapping_add(1);
                slot.descriptor = Some(descriptor);
                pos
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    descriptor: Some(descriptor),
                });
                self.slots.len() - 1
            }
        };
        self.generation += 1;

        let handle = ExtObjHandle {
            index: NonZeroU32::MIN.saturating_add(pos as u32),
            generation: self.slots[pos].generation,
        };
        tracing::info!(name = %name, index = handle.index.get(), "extended object registered");
        Ok(handle)
    }

    pub fn unregister(&mut self, name: &str) -> Result<Rc<dyn ExtObject>, ExtObjError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.descriptor.as_ref().is_some_and(|d| d.name() == name))
            .ok_or_else(|| ExtObjError::NotRegistered {
                name: name.to_string(),
            })?;
        let descriptor = slot.descriptor.take().ok_or_else(|| ExtObjError::NotRegistered {
            name: name.to_string(),
        })?;
        self.generation += 1;
        tracing::info!(name, "extended object unregistered");
        Ok(descriptor)
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<dyn ExtObject>> {
        self.handle_of(name).and_then(|h| self.get(h))
    }

    pub fn handle_of(&self, name: &str) -> Option<ExtObjHandle> {
        self.slots.iter().enumerate().find_map(|(pos, slot)| {
            let descriptor = slot.descriptor.as_ref()?;
            (descriptor.name() == name).then(|| ExtObjHandle {
                index: NonZeroU32::MIN.saturating_add(pos as u32),
                generation: slot.generation,
            })
        })
    }

    /// The descriptor behind `handle`, unless its slot was vacated or reused.
    pub fn get(&self, handle: ExtObjHandle) -> Option<Rc<dyn ExtObject>> {
        let slot = self.slots.get(handle.index.get() as usize - 1)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.descriptor.clone()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.descriptor.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves a composite's link, refreshing its cache.
    pub fn resolve(&self, link: &ExtObjLink) -> Option<Rc<dyn ExtObject>> {
        let name = link.name.as_deref()?;
        match link.cache.get() {
            LinkCache::Resolved(handle) => {
                if let Some(descriptor) = self.get(handle) {
                    return Some(descriptor);
                }
                tracing::debug!(name, "cached extended object handle is stale");
            }
            LinkCache::Invalid { generation } if generation == self.generation => return None,
            _ => {}
        }

        match self.handle_of(name) {
            Some(handle) => {
                link.cache.set(LinkCache::Resolved(handle));
                self.get(handle)
            }
            None => {
                link.cache.set(LinkCache::Invalid {
                    generation: self.generation,
                });
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LinkCache {
    #[default]
    Unresolved,
    Resolved(ExtObjHandle),
    Invalid {
        generation: u64,
    },
}

/// Observable state of a composite's link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Unlinked,
    Linked(ExtObjHandle),
    /// Named but not resolvable, or not resolved yet.
    LinkInvalid,
}

/// A composite's extended-object name plus its cached resolution.
#[derive(Debug, Clone, Default)]
pub struct ExtObjLink {
    name: Option<String>,
    cache: Cell<LinkCache>,
}

impl ExtObjLink {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            cache: Cell::new(LinkCache::Unresolved),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_linked(&self) -> bool {
        self.name.is_some()
    }

    /// Renames the link and drops the cached resolution.
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
        self.cache.set(LinkCache::Unresolved);
    }

    pub fn state(&self) -> LinkState {
        match (&self.name, self.cache.get()) {
            (None, _) => LinkState::Unlinked,
            (Some(_), LinkCache::Resolved(handle)) => LinkState::Linked(handle),
            (Some(_), _) => LinkState::LinkInvalid,
        }
    }

    /// A link with the same name and an empty cache.
    pub fn fresh(&self) -> Self {
        Self::new(self.name.clone())
    }
}
