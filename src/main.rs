use std::path::PathBuf;

use anyhow::Context;
use boardkit::{init_logging, run_session, Config, BUILD_DATE, VERSION};

fn main() -> anyhow::Result<()> {
    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => Config::default_path()?,
    };
    let config = Config::load_or_default(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    init_logging(&config.logging)?;
    tracing::info!(version = VERSION, built = BUILD_DATE, config = %path.display(), "boardkit starting");

    let report = run_session(config.board_options())?;
    tracing::info!(
        composite = %report.composite,
        vias_after_convert = report.vias_after_convert,
        vias_after_edit = report.vias_after_edit,
        undo_steps = report.undo_steps,
        "session finished"
    );

    Ok(())
}
