use std::path::Path;

use tokio::signal;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, writer::MakeWriterExt},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// JSON logs on stdout for the dashboard server.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,hyper=warn,tower_http=info".into()
            }),
        )
        .with(fmt::layer().json())
        .init();
}

/// Plain-text logging for a pipeline step.
///
/// Every event is appended to `<dir>/<step>.log`; warnings and errors are
/// mirrored to stderr so the runner can capture them. The returned guard
/// flushes the file writer on drop and must outlive the step.
pub fn init_step_logging(dir: &Path, step: &str, level: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, format!("{step}.log"));
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(file_writer),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr.with_max_level(Level::WARN)),
        )
        .try_init()?;

    Ok(guard)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! { _ = ctrl_c => {}, _ = terminate => {}, }
    info!("shutdown signal received");
}
