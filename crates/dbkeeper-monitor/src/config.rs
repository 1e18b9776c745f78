//! Configuration Management Module
//!
//! Version: 0.3.0
//!
//! Logging settings, embedded in the application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level or filter directives, `RUST_LOG` takes precedence
    pub log_level: String,
    /// Write to stdout
    pub console: bool,
    /// Write to a daily rolling file
    pub enable_file_logging: bool,
    /// Directory of the log files
    pub log_directory: PathBuf,
    /// File name prefix, files are `<prefix>.<YYYY-MM-DD>`
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            console: true,
            enable_file_logging: true,
            log_directory: PathBuf::from("logs"),
            file_prefix: "dbkeeper.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config: LoggingConfig = serde_json::from_str(r#"{"log_level": "debug"}"#).unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(config.enable_file_logging);
        assert_eq!(config.file_prefix, "dbkeeper.log");
    }
}
