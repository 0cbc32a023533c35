//! Logging Infrastructure
//!
//! Console logging filtered by `RUST_LOG` (falling back to the configured
//! level), optionally mirrored into a daily rolling file.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Log file prefix inside `LOG_DIR`
const LOG_FILE_PREFIX: &str = "entrega-admin";

/// Initialize the logger with console output only
pub fn init_logger(log_level: &str) {
    let _ = init_logger_with_file(log_level, None);
}

/// Initialize the logger with optional file output
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the lifetime of the process. Calling this twice is harmless: the second
/// global subscriber is refused and ignored.
pub fn init_logger_with_file(log_level: &str, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

    let console = fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let file_dir = log_dir.map(Path::new).filter(|p| p.is_dir());
    match file_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = fmt::layer().with_ansi(false).with_writer(writer);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(file)
                .try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .try_init();
            None
        }
    }
}

/// `entrega_admin=<level>,shared=<level>,entrega_printer=<level>`
fn default_directive(log_level: &str) -> String {
    let level = match log_level.trim().to_ascii_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error") => l.to_string(),
        _ => "info".to_string(),
    };
    format!("entrega_admin={level},shared={level},entrega_printer={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(
            default_directive("DEBUG"),
            "entrega_admin=debug,shared=debug,entrega_printer=debug"
        );
        assert!(default_directive("loud").starts_with("entrega_admin=info"));
    }

    #[test]
    fn test_init_with_missing_dir_falls_back_to_console() {
        let guard = init_logger_with_file("info", Some("/definitely/not/a/dir"));
        assert!(guard.is_none());
    }
}
