use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::GlobalConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("invalid RUST_LOG / debug_output filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
}

/// Installs the process-wide `tracing` subscriber and returns the
/// `WorkerGuard` that must be kept alive for the lifetime of the process —
/// dropping it flushes and stops the background writer thread.
///
/// Mirrors the split the ambient stack uses elsewhere in this codebase:
/// `enable_log` picks an hourly-rolling file under `<log_dir>/<instance_id>/`,
/// otherwise everything goes to stdout. `debug_output` raises the default
/// filter from `info` to `debug`; `RUST_LOG` always overrides both.
pub fn init_logging(global: &GlobalConfig) -> Result<WorkerGuard, LoggingError> {
    let default_level = if global.debug_output { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let (writer, guard) = if global.enable_log {
        let dir: PathBuf = PathBuf::from(global.log_dir.as_deref().unwrap_or("logs"))
            .join(global.instance_id.to_string());
        let appender = RollingFileAppender::new(
            Rotation::HOURLY,
            dir,
            format!("netcore-{}", global.instance_id),
        );
        let (nb, guard) = tracing_appender::non_blocking(appender);
        (BoxMakeWriter::new(nb), guard)
    } else {
        let (nb, guard) = tracing_appender::non_blocking(std::io::stdout());
        (BoxMakeWriter::new(nb), guard)
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(!global.enable_log)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}
