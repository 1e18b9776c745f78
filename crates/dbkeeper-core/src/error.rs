//! Error types for dbkeeper core types
//!
//! Raised while interpreting user-supplied engine names and settings, before
//! any external tool is involved.

use thiserror::Error;

/// Errors produced by the core types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The engine name is not one of the supported database engines
    #[error("unsupported database type: {0}")]
    UnsupportedEngine(String),

    /// A configuration value is present but unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
