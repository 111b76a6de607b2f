// src/logging.rs
use anyhow::{Context, Result};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::{MakeWriterExt, Tee, WithMaxLevel};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

pub const DEFAULT_FILTER: &str = "flowbase=info,rocket::server=off";
pub const LOG_DIR: &str = "logs";

/// Every event to `combined.log`, errors also to `error.log`
pub type LogFiles = Tee<NonBlocking, WithMaxLevel<NonBlocking>>;

pub fn file_writers(dir: &Path) -> Result<(LogFiles, Vec<WorkerGuard>)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (combined, combined_guard) = tracing_appender::non_blocking(rolling::never(dir, "combined.log"));
    let (errors, errors_guard) = tracing_appender::non_blocking(rolling::never(dir, "error.log"));

    Ok((
        combined.and(errors.with_max_level(Level::ERROR)),
        vec![combined_guard, errors_guard],
    ))
}

/// Install the global subscriber. Logs go to stderr so command output stays clean.
///
/// Production logs are JSON and are also written to `logs/combined.log`, with
/// errors duplicated into `logs/error.log`. The returned guards flush those
/// files and must be held until the process exits.
pub fn init(production: bool) -> Result<Vec<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = Registry::default().with(filter);

    if !production {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
        return Ok(Vec::new());
    }

    let (files, guards) = file_writers(Path::new(LOG_DIR))?;

    registry
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(files)
                .with_current_span(false)
                .with_span_list(false),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(guards)
}
