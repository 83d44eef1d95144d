use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "SCHOOL_ADMIN_LOG";

/// The terminal belongs to the TUI, so logs go to a file under the user's
/// cache directory. Keep the returned guard alive until exit or buffered
/// lines are lost.
pub fn init() -> Result<(WorkerGuard, PathBuf)> {
    let dir = dirs::cache_dir()
        .map(|d| d.join("school-admin"))
        .context("Could not determine cache directory for the log file")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(&dir, "school-admin.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    Ok((guard, dir.join("school-admin.log")))
}
