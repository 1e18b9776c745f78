//! Logging System
//!
//! Structured logging to the console and to a daily rolling file. The file
//! is written through a non-blocking worker that is flushed when the
//! returned [`LoggingGuard`] is dropped.
//!
//! Version: 0.3.0

use tracing::{debug, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{MonitorError, Result};

/// Keeps the file writer alive, hold it for the life of the process
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Filter from `RUST_LOG`, falling back to `default_directives`
pub fn build_filter(default_directives: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directives).map_err(|e| {
        MonitorError::LoggingError(format!("Invalid log level '{}': {}", default_directives, e))
    })
}

/// Build the subscriber described by `config` without installing it
pub fn build_subscriber(
    config: &LoggingConfig,
) -> Result<(impl Subscriber + Send + Sync + 'static, LoggingGuard)> {
    let filter = build_filter(&config.log_level)?;

    let (file_layer, guard) = if config.enable_file_logging {
        std::fs::create_dir_all(&config.log_directory).map_err(|e| {
            MonitorError::ConfigError(format!(
                "Cannot create log directory {}: {}",
                config.log_directory.display(),
                e
            ))
        })?;
        let appender = tracing_appender::rolling::daily(&config.log_directory, &config.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let console_layer = config.console.then(|| fmt::layer().with_target(true).with_level(true));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer);

    Ok((subscriber, LoggingGuard { _file: guard }))
}

/// Install the global subscriber described by `config`
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    let (subscriber, guard) = build_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        MonitorError::LoggingError(format!("Failed to set global subscriber: {}", e))
    })?;
    debug!("🔧 Logging initialized at level {}", config.log_level);
    Ok(guard)
}
