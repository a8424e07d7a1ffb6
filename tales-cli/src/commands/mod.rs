//! CLI command implementations

pub mod ai;
pub mod browse;
pub mod logs;
pub mod saved;
pub mod session;
pub mod status;
pub mod upgrade;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tales_core::services::{EntryPoint, LogEvent, LoggingService};
use tales_core::TalesContext;
use tracing::debug;

use crate::output;

/// Event logger; `None` when logs.duckdb could not be opened
pub type Logger = Option<LoggingService>;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Logger {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Logger, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

pub fn log_command(logger: &Logger, command: &str) {
    if let Some(l) = logger {
        let _ = l.log_command(command);
    }
}

/// Data directory from `TALES_DIR`, else `~/.tales`
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TALES_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".tales"))
        .ok_or_else(|| anyhow!("Could not find home directory; set TALES_DIR"))
}

/// Open the context and restore (or start) the session
pub fn get_context() -> Result<TalesContext> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    let ctx = TalesContext::new(&data_dir).context("Failed to initialize tales context")?;
    let user = ctx.bootstrap().context("Failed to restore session")?;
    debug!(data_dir = %data_dir.display(), user_id = %user.id, "context ready");
    Ok(ctx)
}

/// Print and clear queued notifications (skipped for JSON output)
pub fn flush_notifications(ctx: &TalesContext, json: bool) {
    let drained = ctx.notifications.drain();
    if json {
        return;
    }
    for notification in drained {
        output::notification(&notification);
    }
}
