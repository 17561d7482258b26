//! Logging Infrastructure
//!
//! Structured logging setup with an optional daily rolling log file.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// File name prefix of the rolling log files
const LOG_FILE_PREFIX: &str = "pos-server";

/// Initialize the logger at `info`
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` overrides `log_level` when set. Calling this more than once
/// (e.g. from several tests) is harmless.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if std::fs::create_dir_all(log_path).is_ok() {
            let file_appender = tracing_appender::rolling::daily(log_path, LOG_FILE_PREFIX);
            let _ = subscriber.with_writer(file_appender).try_init();
            return;
        }
        eprintln!("Cannot create log directory {}, logging to stdout", dir);
    }

    let _ = subscriber.try_init();
}
