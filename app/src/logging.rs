use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber: stderr plus a daily file under `log_dir`.
///
/// Stdout is left to command output. The returned guard must live until exit
/// so buffered file lines get flushed.
pub fn init(log_dir: &Path, level: &str, debug_console: bool) -> Option<WorkerGuard> {
    #[cfg(feature = "tokio-console")]
    if debug_console {
        console_subscriber::init();
        return None;
    }

    let file_appender = rolling::daily(log_dir, "photos.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr.and(file_writer))
        .init();

    if debug_console && cfg!(not(feature = "tokio-console")) {
        tracing::warn!("debug_console requested but the tokio-console feature is disabled");
    }
    Some(guard)
}
