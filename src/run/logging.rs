use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::run::run_dir::LOG_FILE;

/// Installs the global subscriber: human-readable stderr output filtered by
/// `RUST_LOG` (default `info`) plus a plain-text copy in `<run_dir>/log.txt`.
///
/// The returned guard flushes the file writer on drop and must live until
/// the run ends. If a subscriber is already installed the existing one is
/// kept.
pub fn init_logging(run_dir: &Path) -> WorkerGuard {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let file_appender = tracing_appender::rolling::never(run_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("info"));

    if let Err(e) = tracing_subscriber::registry().with(stderr_layer).with(file_layer).try_init() {
        tracing::warn!("Logging already initialized: {}", e);
    }
    guard
}
