//! Undo log with serial grouping and scoped freezing.
//!
//! Records are stamped with the serial active when they are appended; one
//! user-visible undo step is every record sharing a serial. Freezing is
//! expressed through guards ([`SerialFreeze`], [`AddFreeze`], [`ReplayLock`])
//! that share the counters through an `Rc`, so holding one never borrows the
//! board and an early return always unfreezes.

use std::cell::Cell;
use std::rc::Rc;

use boardkit_core::{ObjectFlags, ObjectId};

use crate::object_store::Object;
use crate::subc::SubcSnapshot;

pub type Serial = u64;

/// Where a removed object sat in its parent, for exact restoration.
#[derive(Debug, Clone)]
pub enum Removed {
    Object { object: Box<Object>, slot: usize },
    Subc { snapshot: Box<SubcSnapshot>, slot: usize },
}

/// A reversible change. Applying one yields its inverse.
#[derive(Debug, Clone)]
pub enum UndoOp {
    /// Full object state before a geometry or attribute edit.
    Modify { before: Box<Object> },
    /// Flags of an object or composite before a flag change.
    Flags { id: ObjectId, before: ObjectFlags },
    /// An object or composite that was created.
    Create { id: ObjectId },
    /// An object or composite that was removed.
    Remove { removed: Removed },
    /// Whole composite state, children included.
    Subc { before: Box<SubcSnapshot> },
    /// A composite attribute value before it was changed.
    SubcAttr {
        id: ObjectId,
        key: String,
        before: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub serial: Serial,
    pub op: UndoOp,
}

#[derive(Debug, Default)]
struct Counters {
    serial: Cell<Serial>,
    serial_frozen: Cell<u32>,
    add_frozen: Cell<u32>,
    locked: Cell<u32>,
    owed: Cell<bool>,
    last_serial: Cell<Option<Serial>>,
}

impl Counters {
    /// Bumps the serial if the current one has been used by a record.
    fn bump(&self) -> bool {
        if self.last_serial.get() == Some(self.serial.get()) {
            self.serial.set(self.serial.get() + 1);
            true
        } else {
            false
        }
    }
}

/// Suppresses serial increments until dropped.
///
/// Increments requested meanwhile are owed; the outermost guard settles
/// them into a single bump.
#[must_use = "the serial is unfrozen as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SerialFreeze {
    counters: Rc<Counters>,
}

impl Drop for SerialFreeze {
    fn drop(&mut self) {
        let c = &self.counters;
        let depth = c.serial_frozen.get().saturating_sub(1);
        c.serial_frozen.set(depth);
        if depth == 0 && c.owed.replace(false) {
            c.bump();
        }
    }
}

/// Suppresses record creation until dropped.
#[must_use = "record creation resumes as soon as the guard is dropped"]
#[derive(Debug)]
pub struct AddFreeze {
    counters: Rc<Counters>,
}

impl Drop for AddFreeze {
    fn drop(&mut self) {
        let c = &self.counters;
        c.add_frozen.set(c.add_frozen.get().saturating_sub(1));
    }
}

/// Held while undo or redo replays records: nothing is recorded and the
/// serial does not move.
#[must_use]
#[derive(Debug)]
pub struct ReplayLock {
    counters: Rc<Counters>,
}

impl Drop for ReplayLock {
    fn drop(&mut self) {
        let c = &self.counters;
        c.locked.set(c.locked.get().saturating_sub(1));
    }
}

/// Append-only log of reversible records grouped by serial.
#[derive(Debug)]
pub struct UndoLog {
    counters: Rc<Counters>,
    records: Vec<UndoRecord>,
    redo: Vec<UndoRecord>,
    max_serials: usize,
}

impl UndoLog {
    pub fn new(max_serials: usize) -> Self {
        Self {
            counters: Rc::new(Counters::default()),
            records: Vec::new(),
            redo: Vec::new(),
            max_serials: max_serials.max(1),
        }
    }

    /// The serial new records are stamped with.
    pub fn serial(&self) -> Serial {
        self.counters.serial.get()
    }

    pub fn is_serial_frozen(&self) -> bool {
        self.counters.serial_frozen.get() > 0
    }

    pub fn is_add_frozen(&self) -> bool {
        self.counters.add_frozen.get() > 0
    }

    pub fn is_locked(&self) -> bool {
        self.counters.locked.get() > 0
    }

    pub fn freeze_serial(&self) -> SerialFreeze {
        let c = &self.counters;
        c.serial_frozen.set(c.serial_frozen.get() + 1);
        SerialFreeze {
            counters: Rc::clone(c),
        }
    }

    pub fn freeze_add(&self) -> AddFreeze {
        let c = &self.counters;
        c.add_frozen.set(c.add_frozen.get() + 1);
        AddFreeze {
            counters: Rc::clone(c),
        }
    }

    pub(crate) fn lock(&self) -> ReplayLock {
        let c = &self.counters;
        c.locked.set(c.locked.get() + 1);
        ReplayLock {
            counters: Rc::clone(c),
        }
    }

    /// Closes the current undo step.
    ///
    /// A no-op if nothing was recorded under the current serial. While the
    /// serial is frozen the increment is owed instead.
    pub fn inc_serial(&self) {
        let c = &self.counters;
        if c.locked.get() > 0 {
            return;
        }
        if c.serial_frozen.get() > 0 {
            c.owed.set(true);
            return;
        }
        if c.bump() {
            tracing::trace!(serial = c.serial.get(), "undo serial advanced");
        }
    }

    /// Appends a record under the current serial unless creation is frozen.
    pub fn record(&mut self, op: UndoOp) {
        if self.is_locked() || self.is_add_frozen() {
            return;
        }
        let serial = self.serial();
        self.records.push(UndoRecord { serial, op });
        self.counters.last_serial.set(Some(serial));
        self.redo.clear();
        self.trim();
    }

    fn trim(&mut self) {
        let Some(first) = self.records.first().map(|r| r.serial) else {
            return;
        };
        if self.serial().saturating_sub(first) >= self.max_serials as Serial {
            let keep = self.records.partition_point(|r| r.serial == first);
            self.records.drain(..keep);
        }
    }

    pub fn records(&self) -> &[UndoRecord] {
        &self.records
    }

    pub fn can_undo(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Pops every record of the newest serial, newest first.
    pub(crate) fn take_undo_group(&mut self) -> Option<(Serial, Vec<UndoOp>)> {
        let serial = self.records.last()?.serial;
        let start = self.records.partition_point(|r| r.serial < serial);
        let ops = self.records.drain(start..).rev().map(|r| r.op).collect();
        Some((serial, ops))
    }

    /// Pops every record appended after the first `mark` ones, newest first.
    ///
    /// Used to back out a half-finished edit that is still on the current
    /// serial.
    pub(crate) fn take_since(&mut self, mark: usize) -> Vec<UndoOp> {
        let start = mark.min(self.records.len());
        let ops = self.records.drain(start..).rev().map(|r| r.op).collect();
        self.counters
            .last_serial
            .set(self.records.last().map(|r| r.serial));
        ops
    }

    /// Pops the next redo group, in the order it has to be replayed.
    pub(crate) fn take_redo_group(&mut self) -> Option<(Serial, Vec<UndoOp>)> {
        let serial = self.redo.last()?.serial;
        let mut ops = Vec::new();
        while self.redo.last().is_some_and(|r| r.serial == serial) {
            if let Some(r) = self.redo.pop() {
                ops.push(r.op);
            }
        }
        Some((serial, ops))
    }

    /// Stores the inverses produced by an undo, in replay order.
    pub(crate) fn finish_undo(&mut self, serial: Serial, inverses: Vec<UndoOp>) {
        self.redo
            .extend(inverses.into_iter().map(|op| UndoRecord { serial, op }));
        self.counters.serial.set(serial);
        self.counters
            .last_serial
            .set(self.records.last().map(|r| r.serial));
    }

    /// Stores the inverses produced by a redo back on the undo stack.
    pub(crate) fn finish_redo(&mut self, serial: Serial, inverses: Vec<UndoOp>) {
        self.records
            .extend(inverses.into_iter().map(|op| UndoRecord { serial, op }));
        self.counters.serial.set(serial + 1);
        self.counters
            .last_serial
            .set(self.records.last().map(|r| r.serial));
    }
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new(100)
    }
}
