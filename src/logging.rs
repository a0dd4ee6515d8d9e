//! Tracing setup for migration runs.
//!
//! Every run logs to stdout and to a file, so the ids and stages of skipped rows outlive the
//! terminal session. The file comes from `MIGRATE_LOG_FILE` via [`Config::log_file`] and
//! defaults to [`DEFAULT_LOG_FILE`].
//!
//! [`Config::log_file`]: crate::config::Config::log_file
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Log file used when none is configured.
pub const DEFAULT_LOG_FILE: &str = "logs/content-migrate.log";

/// Install the stdout and file subscribers.
///
/// `RUST_LOG` filters both layers and defaults to `info`. When the log file cannot be opened
/// the run continues on stdout alone and the failure is logged once the subscriber is up.
pub fn init_tracing(log_file: Option<&Path>) {
    let path = log_file_path(log_file);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let mut file_error = None;
    let file_layer = match open_log_file(&path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            Some(fmt::layer().with_writer(writer).with_ansi(false).compact())
        }
        Err(error) => {
            file_error = Some(error);
            None
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    match file_error {
        Some(error) => tracing::warn!(path = %path.display(), %error, "File logging disabled"),
        None => tracing::debug!(path = %path.display(), "Logging to file"),
    }
}

fn log_file_path(configured: Option<&Path>) -> PathBuf {
    configured.map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), Path::to_path_buf)
}

/// Open `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> io::Result<File> {
    let parent = path.parent().unwrap_or(Path::new(""));
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
