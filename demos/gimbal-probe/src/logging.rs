//! Subscriber setup: stderr for the operator, a rolling file for the
//! gimbal's diagnostic log.

use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Log files are named `gimbal.<date>.log`.
pub const LOG_FILE_PREFIX: &str = "gimbal";

/// Daily-rotated log file in `dir`; the current file and one backup are
/// kept.
pub fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(2)
        .build(dir)
}

/// The file gets info and above from the gimbal crates (wire traffic
/// included), whatever `RUST_LOG` says.
pub fn file_targets() -> Targets {
    Targets::new().with_target("gimbal", LevelFilter::INFO)
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the life of the process.
pub fn init(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>, InitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry().with(stderr).init();
        return Ok(None);
    };

    let (writer, guard) = tracing_appender::non_blocking(file_appender(dir)?);
    let file = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(file_targets());
    tracing_subscriber::registry().with(stderr).with(file).init();
    Ok(Some(guard))
}
