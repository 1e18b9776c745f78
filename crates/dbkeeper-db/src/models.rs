//! Audit log models
//!
//! One row of `backup_restore_logs` per backup or restore attempt.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use crate::error::AuditError;

/// Kind of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// Backup, full or table-scoped
    Backup,
    /// Restore of any kind, including point-in-time
    Restore,
}

impl AuditAction {
    /// Stored form
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Backup => "backup",
            AuditAction::Restore => "restore",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backup" => Ok(AuditAction::Backup),
            "restore" => Ok(AuditAction::Restore),
            other => Err(AuditError::InvalidValue(format!("action '{other}'"))),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    /// Completed
    Success,
    /// Aborted by an error
    Failed,
}

impl AuditStatus {
    /// Stored form
    pub fn as_str(self) -> &'static str {
        match self {
            AuditStatus::Success => "Success",
            AuditStatus::Failed => "Failed",
        }
    }

    /// Status of an operation result
    pub fn of<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            AuditStatus::Success
        } else {
            AuditStatus::Failed
        }
    }
}

impl FromStr for AuditStatus {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Success" => Ok(AuditStatus::Success),
            "Failed" => Ok(AuditStatus::Failed),
            other => Err(AuditError::InvalidValue(format!("status '{other}'"))),
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation about to be recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    /// Operation kind
    pub action: AuditAction,
    /// Dump file written or read
    pub file_path: String,
    /// Table scope, empty for the whole database
    pub tables: Vec<String>,
    /// Outcome
    pub status: AuditStatus,
}

impl NewAuditEntry {
    /// Create a new entry
    pub fn new(
        action: AuditAction,
        file_path: impl Into<String>,
        tables: &[String],
        status: AuditStatus,
    ) -> Self {
        Self {
            action,
            file_path: file_path.into(),
            tables: tables.to_vec(),
            status,
        }
    }

    /// Comma-joined table scope as stored
    pub fn tables_column(&self) -> String {
        self.tables.join(",")
    }
}

/// A recorded operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    /// Surrogate key
    pub id: i32,
    /// Operation kind
    pub action: AuditAction,
    /// Dump file written or read
    pub file_path: String,
    /// When the operation finished
    pub date: DateTime<Utc>,
    /// Comma-joined table scope, empty for the whole database
    pub tables: String,
    /// Outcome
    pub status: AuditStatus,
}

impl<'r> FromRow<'r, PgRow> for AuditRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let decode = |e: AuditError| sqlx::Error::Decode(Box::new(e));
        Ok(Self {
            id: row.try_get("id")?,
            action: row.try_get::<String, _>("action")?.parse().map_err(decode)?,
            file_path: row.try_get("file_path")?,
            date: row.try_get("date")?,
            tables: row.try_get("tables")?,
            status: row.try_get::<String, _>("status")?.parse().map_err(decode)?,
        })
    }
}
