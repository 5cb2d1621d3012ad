use crate::storage;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;

/// Initializes tracing with a console layer, plus a daily log file under the
/// logs folder when the log-to-file preference is set. A file that cannot be
/// opened degrades to console-only logging.
pub fn init(log_to_file: bool) {
    let console = tracing_subscriber::fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_target(false);
    let file = if log_to_file { open_log_file() } else { None };
    let file_layer = file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_timer(UtcTime::rfc_3339())
            .with_target(false)
            .with_ansi(false)
            .with_writer(Arc::new(file))
    });
    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init();
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = storage::logs_dir().ok()?;
    storage::ensure_dir(&dir).ok()?;
    let path = storage::log_file_path(&dir);
    OpenOptions::new().create(true).append(true).open(path).ok()
}
