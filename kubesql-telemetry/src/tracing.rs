use kubesql_config::Environment;
use std::io::Error;
use std::sync::Once;
use thiserror::Error;
use tracing::subscriber::{SetGlobalDefaultError, set_global_default};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, InitError},
};
use tracing_log::{LogTracer, log_tracer::SetLoggerError};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Directory receiving rotated log files in production mode.
const LOG_DIR: &str = "logs";

/// Maximum number of rotated log files kept on disk.
const MAX_LOG_FILES: usize = 5;

/// Errors that can occur during tracing initialization.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to build rolling file appender: {0}")]
    InitAppender(#[from] InitError),

    #[error("failed to init log tracer: {0}")]
    InitLogTracer(#[from] SetLoggerError),

    #[error("failed to set global default subscriber: {0}")]
    SetGlobalDefault(#[from] SetGlobalDefaultError),

    #[error("an io error occurred: {0}")]
    Io(#[from] Error),
}

/// Log flusher handle for ensuring logs are written before shutdown.
///
/// Production mode returns a [`WorkerGuard`] that must be kept alive to ensure
/// logs are flushed. Development mode doesn't require flushing.
#[must_use]
pub enum LogFlusher {
    /// Production flusher that ensures logs are written to files.
    Flusher(WorkerGuard),
    /// Development flusher that doesn't require explicit flushing.
    NullFlusher,
}

static INIT_TEST_TRACING: Once = Once::new();

/// Initializes tracing for test environments.
///
/// Call once at the beginning of tests. Set `ENABLE_TRACING=1` to view tracing output:
/// ```bash
/// ENABLE_TRACING=1 cargo test test_name
/// ```
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var("ENABLE_TRACING").is_ok() {
            // With no environment set the default is prod, which logs to files;
            // tests want terminal output.
            Environment::Dev.set();
            let _log_flusher =
                init_tracing("test").expect("Failed to initialize tracing for tests");
        }
    });
}

/// Initializes tracing for the application.
///
/// Sets up structured logging with environment-appropriate configuration.
/// Production environments log JSON to rotating files, development to console.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    // Initialize the log tracer to capture records from libraries that use the
    // `log` crate and forward them to the `tracing` subscriber.
    LogTracer::init()?;

    let is_prod = Environment::load()?.is_prod();

    // Default the log level to `info` if `RUST_LOG` is not set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_flusher = if is_prod {
        configure_prod_tracing(filter, app_name)?
    } else {
        configure_dev_tracing(filter)?
    };

    // Return the log flusher so the caller keeps it alive until exit; without it,
    // buffered log lines may never reach the file.
    Ok(log_flusher)
}

/// Configures tracing for production environments.
///
/// Sets up structured JSON logging to rotating daily files.
fn configure_prod_tracing(filter: EnvFilter, app_name: &str) -> Result<LogFlusher, TracingError> {
    let file_appender = rolling::Builder::new()
        .filename_prefix(app_name)
        .filename_suffix("log")
        .rotation(rolling::Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .build(LOG_DIR)?;

    // Non-blocking appender so the logging thread never stalls on file IO.
    let (file_appender, guard) = tracing_appender::non_blocking(file_appender);

    let format = fmt::format()
        .with_level(true)
        // ANSI colors are only for terminal output.
        .with_ansi(false)
        .with_target(false);

    let subscriber = Registry::default().with(filter).with(
        fmt::layer()
            .event_format(format)
            .with_writer(file_appender)
            .json()
            .with_current_span(true)
            .with_span_list(true),
    );

    set_global_default(subscriber)?;

    Ok(LogFlusher::Flusher(guard))
}

/// Configures tracing for development environments.
///
/// Sets up pretty-printed console logging with ANSI colors for readability.
fn configure_dev_tracing(filter: EnvFilter) -> Result<LogFlusher, TracingError> {
    let format = fmt::format()
        .with_level(true)
        .with_ansi(true)
        .pretty()
        .with_line_number(false)
        .with_file(false)
        .with_target(true);

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().event_format(format));

    set_global_default(subscriber)?;

    Ok(LogFlusher::NullFlusher)
}
