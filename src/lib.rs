//! # BoardKit
//!
//! The object-operation engine of an interactive printed-circuit-board
//! layout editor:
//! - Per-kind dispatch of move, copy, rotate, resize, clearance, flag, clip
//!   and remove operations
//! - Composites (subcircuits) with consistent spatial index and bounding
//!   boxes under every edit
//! - Extended objects that regenerate derived geometry from editable
//!   floaters, with `line-of-vias` built in
//! - Serial-grouped undo and redo
//!
//! ## Architecture
//!
//! BoardKit is organized as a workspace with multiple crates:
//!
//! 1. **boardkit-core** - Identity, kinds, flags, units, bounding boxes, errors
//! 2. **boardkit-designer** - Board document, operation tables, executor, extended objects
//! 3. **boardkit-settings** - Configuration files and validation
//! 4. **boardkit** - Re-exports, logging setup and the demo binary

use std::rc::Rc;

pub use boardkit_core::{
    BoundingBox, Coord, Error, ExtObjError, FloaterBboxPolicy, KindMask, ObjectFlags, ObjectId,
    ObjectKind, OperationError, Point, Result,
};
pub use boardkit_designer as designer;
pub use boardkit_designer::{
    apply, apply_single, apply_to_selected, begin_operation, Board, BoardOptions, DataOwner,
    LineOfVias, OpCtx, OpParams, Operation, SelectFlags, Selector, Target,
};
pub use boardkit_settings::{Config, LogLevel, LoggingSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging from the configured settings
///
/// Sets up structured logging with:
/// - `RUST_LOG` support, falling back to the configured level
/// - Human-readable or JSON-lines output
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    if settings.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// What the scripted session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub composite: ObjectId,
    pub vias_after_convert: usize,
    pub vias_after_edit: usize,
    pub composite_bbox: BoundingBox,
    pub undo_steps: usize,
}

const MM: Coord = 1_000_000;

fn via_count(board: &Board, sid: ObjectId) -> usize {
    board.subc(sid).map(|s| s.data.padstacks.len()).unwrap_or(0)
}

/// Runs a short scripted edit session on a fresh board: converts a trace
/// into a line of vias, lengthens it, moves the whole composite, then undoes
/// everything.
pub fn run_session(options: BoardOptions) -> anyhow::Result<SessionReport> {
    use anyhow::Context;

    let mut board = Board::with_options(options);
    board.register_extobj(Rc::new(LineOfVias::new()))?;
    let top = board.add_layer("top");
    board.add_layer("bottom");

    let trace = board.add_line(
        top,
        designer::Line::new(Point::new(0, 0), Point::new(10 * MM, 0), 250_000),
    )?;
    let sid = board
        .extobj_convert(LineOfVias::NAME, DataOwner::Board, &[trace], true)
        .context("line-of-vias conversion declined")?;
    let vias_after_convert = via_count(&board, sid);
    tracing::info!(subc = %sid, vias = vias_after_convert, "trace converted");

    let edit = board
        .subc(sid)
        .and_then(|s| s.data.layers.first())
        .and_then(|l| l.lines.first().copied())
        .context("composite has no edit line")?;
    let stretch = begin_operation(
        "move",
        &OpParams {
            dx: Some(4 * MM),
            ..Default::default()
        },
    )?;
    apply(
        &mut board,
        &stretch,
        Selector::Single(Target::point(ObjectKind::LinePoint, edit, 1)),
    )?;
    let vias_after_edit = via_count(&board, sid);
    tracing::info!(subc = %sid, vias = vias_after_edit, "edit line lengthened");

    board.select(sid, false);
    let shift = begin_operation(
        "move",
        &OpParams {
            dy: Some(2 * MM),
            ..Default::default()
        },
    )?;
    apply(
        &mut board,
        &shift,
        Selector::Selected {
            kinds: KindMask::SELECTABLE,
            flags: SelectFlags::INCLUDE_LOCKED,
            reset: true,
        },
    )?;
    let composite_bbox = board.bbox_of(sid).context("composite vanished")?;

    let mut undo_steps = 0;
    while board.undo() {
        undo_steps += 1;
    }
    tracing::info!(undo_steps, objects = board.store().len(), "session undone");

    Ok(SessionReport {
        composite: sid,
        vias_after_convert,
        vias_after_edit,
        composite_bbox,
        undo_steps,
    })
}
