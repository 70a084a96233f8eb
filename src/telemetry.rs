use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber: human readable output on stdout plus
/// an append-only fault log that only receives ERROR events.
///
/// The returned guard flushes the fault log on drop and must be held for
/// the lifetime of the process.
pub fn init(error_log: &Path) -> WorkerGuard {
    let directory = error_log
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = error_log
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "errorlog".into());

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (fault_writer, guard) = tracing_appender::non_blocking(appender);

    let stdout_layer = fmt::layer()
        .with_target(false)
        .pretty()
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        );

    let fault_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(fault_writer)
        .with_filter(LevelFilter::ERROR);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(fault_layer)
        .init();

    guard
}
