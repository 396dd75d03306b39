//! Logging setup: stderr plus a per-session log file.

use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber.
///
/// Logs go to stderr and to `{log_dir}/{session}/client.log`. `RUST_LOG`
/// refines the default `info` level. Keep the returned guard alive until
/// exit or buffered file lines are lost.
pub fn setup_logging(log_dir: &Path, session: Option<&str>) -> Result<WorkerGuard> {
    let session = session
        .map(str::to_string)
        .unwrap_or_else(|| format!("session_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")));

    let session_log_dir = log_dir.join(&session);
    std::fs::create_dir_all(&session_log_dir)?;

    let file_appender = tracing_appender::rolling::never(&session_log_dir, "client.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    tracing::info!("Logging initialized: session={}", session);
    tracing::info!("Log file: {}/client.log", session_log_dir.display());

    Ok(guard)
}
