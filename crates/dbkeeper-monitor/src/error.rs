//! Error Handling Module
//!
//! Version: 0.3.0

use thiserror::Error;

/// Main error type for the monitoring crate
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Logging system errors
    #[error("Logging error: {0}")]
    LoggingError(String),
}

/// Result type for monitoring operations
pub type Result<T> = std::result::Result<T, MonitorError>;
