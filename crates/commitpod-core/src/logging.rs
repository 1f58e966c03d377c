//! Logging setup

use crate::error::{CoreError, CoreResult};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Install the global subscriber.
///
/// Logs go to stderr so stdout stays clean for the generated message. With a
/// `log_dir`, records are also appended to a daily rotated `commitpod.log`
/// there; keep the returned guard alive until exit so buffered lines are
/// flushed. A log directory that cannot be created is reported on stderr
/// and skipped.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> CoreResult<Option<WorkerGuard>> {
    let filter: LevelFilter = level
        .parse()
        .map_err(|_| CoreError::InvalidLogLevel(level.to_string()))?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let (file_layer, guard) = match log_dir.filter(|dir| ensure_log_dir(dir)) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "commitpod.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CoreError::Logging(e.to_string()))?;

    Ok(guard)
}

fn ensure_log_dir(dir: &Path) -> bool {
    match fs::create_dir_all(dir) {
        Ok(()) => true,
        Err(e) => {
            eprintln!(
                "Warning: cannot create log directory {}: {}; file logging disabled",
                dir.display(),
                e
            );
            false
        }
    }
}
