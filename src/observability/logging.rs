use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes console logging plus a daily-rolling JSON log under `log_dir`.
pub fn init_logging(log_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "candidate_filings.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_writer(non_blocking_writer);

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("candidate_filings=info".parse()?))
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    // The writer flushes on drop; the subscriber lives for the whole process.
    std::mem::forget(guard);
    Ok(())
}
