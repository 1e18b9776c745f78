//! Error types for the audit store

use thiserror::Error;

/// Audit store errors
#[derive(Error, Debug)]
pub enum AuditError {
    /// Query or connection failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value that does not map onto the audit model
    #[error("Invalid audit value: {0}")]
    InvalidValue(String),
}

/// Result type for audit operations
pub type AuditResult<T> = Result<T, AuditError>;
