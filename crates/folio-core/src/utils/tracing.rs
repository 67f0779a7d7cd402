use chrono::Local;
use std::io;
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Initialize the tracing system with a file logger that appends to a
/// timestamp-named file. Configuration is loaded from the RUST_LOG
/// environment variable.
pub fn init_tracing() -> io::Result<()> {
    let now = Local::now();
    let timestamp = now.format("%Y%m%d_%H%M%S");

    if let Some(home_dir) = dirs::home_dir() {
        let log_dir = home_dir.join(".folio");
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = rolling::never(log_dir.clone(), format!("{}.log", timestamp));

        let filter = EnvFilter::from_default_env();

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::Layer::new()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter);

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("global tracing subscriber already set");
            return Ok(());
        }

        tracing::debug!(
            path = %log_dir.join(format!("{}.log", timestamp)).display(),
            "Tracing initialized with file output. Filter configured via RUST_LOG env var."
        );
    } else {
        // Fallback to stdout
        let filter = EnvFilter::from_default_env();

        let subscriber = tracing_subscriber::registry()
            .with(fmt::Layer::default().with_ansi(true).with_target(true))
            .with(filter);

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            return Ok(());
        }

        tracing::debug!(
            "Tracing initialized with stdout output. Filter configured via RUST_LOG env var."
        );
    }

    Ok(())
}
