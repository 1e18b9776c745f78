//! Error types for dbkeeper backup operations
//!
//! Version: 0.3.0

use std::{io, path::PathBuf};

use dbkeeper_core::CoreError;
use thiserror::Error;

/// Main error type for backup, restore and scheduling operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Invalid engine or configuration
    #[error(transparent)]
    Core(#[from] CoreError),

    /// I/O error while handling dump files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file to restore from does not exist
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The dump exists but could not be read
    #[error("cannot read dump {}: {source}", path.display())]
    DumpUnreadable {
        /// Dump file
        path: PathBuf,
        /// Underlying read error
        source: io::Error,
    },

    /// A native tool could not be started
    #[error("failed to start {tool}: {source}")]
    Spawn {
        /// Program that failed to start
        tool: String,
        /// Underlying spawn error
        source: io::Error,
    },

    /// A native tool exited unsuccessfully
    #[error(
        "{tool} failed with {}: {stderr}",
        code.map_or("signal".to_string(), |c| format!("exit code {c}"))
    )]
    ToolFailed {
        /// Program that failed
        tool: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// None of the requested tables exist in the dump
    #[error("none of the requested tables were found in the dump: {}", .0.join(", "))]
    NoTablesMatched(Vec<String>),

    /// A recovery target that is not `YYYY-MM-DDTHH:MM:SS`
    #[error("invalid restore date '{0}', expected YYYY-MM-DDTHH:MM:SS")]
    InvalidDate(String),

    /// No binary log files to replay
    #[error("no binary logs found in {}", .0.display())]
    NoBinlogs(PathBuf),

    /// Operation not available for the engine
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Invalid or exhausted cron schedule
    #[error("invalid schedule: {0}")]
    Schedule(String),

    /// Other backup error
    #[error("backup error: {0}")]
    Other(String),
}

impl BackupError {
    /// Create a new tool failure error
    pub fn tool_failed(tool: impl Into<String>, code: Option<i32>, stderr: &[u8]) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            code,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }

    /// Create a new spawn error
    pub fn spawn(tool: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn { tool: tool.into(), source }
    }

    /// Create a new unsupported operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a new schedule error
    pub fn schedule(msg: impl Into<String>) -> Self {
        Self::Schedule(msg.into())
    }

    /// Create a new other error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether the error came from bad input rather than a failing tool
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Core(_)
                | Self::InputNotFound(_)
                | Self::InvalidDate(_)
                | Self::Unsupported(_)
                | Self::Schedule(_)
        )
    }
}

/// Result type for backup operations
pub type BackupResult<T> = Result<T, BackupError>;
