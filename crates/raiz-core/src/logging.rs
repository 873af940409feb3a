//! Tracing subscriber setup.
//!
//! Logs go to stderr (stdout is reserved for command output) and,
//! optionally, to a file through a non-blocking writer.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Keeps the file writer flushing until dropped.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Picks the filter directive: `RAIZ_LOG` (if non-blank) over config.
pub fn filter_directive(env: Option<&str>, configured: &str) -> String {
    env.map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(configured)
        .to_string()
}

/// Installs the global subscriber.
///
/// # Errors
/// Returns an error for an invalid filter directive or if a subscriber is
/// already installed.
pub fn init(config: &LoggingConfig) -> Result<LogGuard> {
    let env = std::env::var("RAIZ_LOG").ok();
    let directive = filter_directive(env.as_deref(), &config.filter);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter '{directive}'"))?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match config.file.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create log directory {}", dir.display()))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;

    Ok(LogGuard { _file: guard })
}
