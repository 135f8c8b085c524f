//! Logging infrastructure for castwatch
//!
//! Diagnostics and status reports both flow through `tracing`; this module
//! installs the subscriber that decides where they end up.

use std::str::FromStr;

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Environment variable selecting the [`LoggingMode`]
pub const ENV_LOG_MODE: &str = "CASTWATCH_LOG_MODE";
/// Environment variable overriding the filter directives
pub const ENV_LOG_LEVEL: &str = "CASTWATCH_LOG_LEVEL";

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No output
    Silent,
    /// Compact stderr output at info level
    Development,
    /// Verbose diagnostics with thread ids and source locations
    Debug,
    /// One JSON object per event, for log shippers
    Json,
}

impl FromStr for LoggingMode {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(LoggingMode::Silent),
            "development" | "dev" => Ok(LoggingMode::Development),
            "debug" => Ok(LoggingMode::Debug),
            "json" => Ok(LoggingMode::Json),
            other => Err(LoggingError::InvalidEnv(format!("unknown logging mode '{}'", other))),
        }
    }
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid environment variable: {0}")]
    InvalidEnv(String),
}

/// Initialize logging with the specified mode
///
/// Call this before discovery starts so the first device reports are not
/// lost.
///
/// # Environment Variables
///
/// - `CASTWATCH_LOG_LEVEL`: filter directives (`info`, `cast_monitor=debug`, ...)
/// - `RUST_LOG`: used when `CASTWATCH_LOG_LEVEL` is unset
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    init_logging_with_filter(mode, None)
}

/// Initialize logging with an explicit filter that takes precedence over the
/// environment.
pub fn init_logging_with_filter(mode: LoggingMode, directives: Option<&str>) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let filter = create_env_filter(directives, "info");

            Registry::default()
                .with(fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact())
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let filter = create_env_filter(directives, "debug");

            Registry::default()
                .with(fmt::layer()
                    .pretty()
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true))
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Json => {
            let filter = create_env_filter(directives, "info");

            Registry::default()
                .with(fmt::layer().json().with_current_span(false))
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Initialize logging from environment variables
///
/// Reads `CASTWATCH_LOG_MODE` (silent, development, debug, json). Unset
/// means Development, since the reports are the program's output.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = match std::env::var(ENV_LOG_MODE) {
        Ok(raw) => raw.parse()?,
        Err(_) => LoggingMode::Development,
    };

    init_logging(mode)
}

/// Pick filter directives: explicit, then CASTWATCH_LOG_LEVEL, then RUST_LOG, then default
fn create_env_filter(directives: Option<&str>, default_level: &str) -> EnvFilter {
    if let Some(directives) = directives {
        EnvFilter::new(directives)
    } else if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
        EnvFilter::new(level)
    } else if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        EnvFilter::new(default_level)
    }
}
