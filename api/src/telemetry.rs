use thiserror::Error;
use tracing::subscriber::{set_global_default, SetGlobalDefaultError};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, InitError},
};
use tracing_log::{log_tracer::SetLoggerError, LogTracer};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    EnvFilter, FmtSubscriber,
};

use crate::configuration::{DEV_ENV_NAME, PROD_ENV_NAME};

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to build rolling file appender: {0}")]
    InitAppender(#[from] InitError),

    #[error("failed to init log tracer: {0}")]
    InitLogTracer(#[from] SetLoggerError),

    #[error("failed to set global default subscriber: {0}")]
    SetGlobalDefault(#[from] SetGlobalDefaultError),
}

#[must_use]
pub enum LogFlusher {
    Flusher(WorkerGuard),
    NullFlusher,
}

/// Initializes tracing for the application.
///
/// In dev the logs go to the terminal, pretty-printed. In prod they go to
/// daily-rotated files in the `logs` directory, as JSON, via a non-blocking
/// writer. The returned [`LogFlusher`] must be held for the lifetime of the
/// process so buffered logs are flushed on exit.
pub fn init_tracing() -> Result<LogFlusher, TracingError> {
    // Capture logs emitted via the `log` facade by libraries and forward
    // them to the `tracing` subscriber.
    LogTracer::init()?;

    let is_prod =
        std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| DEV_ENV_NAME.into()) == PROD_ENV_NAME;

    // Default to `info` if RUST_LOG is not set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_flusher = if is_prod {
        configure_prod_tracing(filter)?
    } else {
        configure_dev_tracing(filter)?
    };

    Ok(log_flusher)
}

fn configure_prod_tracing(filter: EnvFilter) -> Result<LogFlusher, TracingError> {
    let app_name = env!("CARGO_CRATE_NAME");
    let file_appender = rolling::Builder::new()
        .filename_prefix(app_name)
        .filename_suffix("log")
        .rotation(rolling::Rotation::DAILY)
        .max_log_files(5)
        .build("logs")?;

    let (file_appender, guard) = tracing_appender::non_blocking(file_appender);

    let format = fmt::format()
        .with_level(true)
        // ANSI colors are only for terminal output
        .with_ansi(false)
        .with_target(false);

    let subscriber = FmtSubscriber::builder()
        .event_format(format)
        .with_writer(file_appender)
        .json()
        // a request is a span, so emitting an event on span close logs
        // every completed request
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(filter)
        .finish();

    set_global_default(subscriber)?;
    Ok(LogFlusher::Flusher(guard))
}

fn configure_dev_tracing(filter: EnvFilter) -> Result<LogFlusher, TracingError> {
    let format = fmt::format()
        .with_level(true)
        .with_ansi(true)
        .pretty()
        .with_line_number(false)
        .with_file(false)
        .with_target(false);

    let subscriber = FmtSubscriber::builder()
        .event_format(format)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(filter)
        .finish();

    set_global_default(subscriber)?;
    Ok(LogFlusher::NullFlusher)
}
