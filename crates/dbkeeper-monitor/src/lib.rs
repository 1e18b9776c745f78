//! dbkeeper Monitoring
//!
//! Version: 0.3.0
//!
//! Structured logging for the dbkeeper binary: an `EnvFilter` controlled
//! console layer plus the durable daily log file.

pub mod config;
pub mod error;
pub mod logging;

pub use config::LoggingConfig;
pub use error::{MonitorError, Result};
pub use logging::{init_logging, LoggingGuard};
