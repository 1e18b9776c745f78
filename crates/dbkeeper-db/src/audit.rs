//! Audit log of backup and restore operations
//!
//! [`PgAuditStore`] persists to `backup_restore_logs`. [`MemoryAuditStore`]
//! keeps the most recent records for the life of the process and serves
//! deployments without an audit database.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPool;
use tokio::sync::RwLock;
use tracing::{debug, error, instrument};

use crate::error::AuditResult;
use crate::models::{AuditRecord, NewAuditEntry};

/// Append-only record of operations
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Store one entry
    async fn record(&self, entry: NewAuditEntry) -> AuditResult<AuditRecord>;

    /// All entries, newest first
    async fn list(&self) -> AuditResult<Vec<AuditRecord>>;
}

/// Store an entry, logging instead of returning a failure
pub async fn record_or_log(log: &dyn AuditLog, entry: NewAuditEntry) {
    let summary = format!("{} {} ({})", entry.action, entry.file_path, entry.status);
    match log.record(entry).await {
        Ok(record) => debug!("📝 Audit record {} stored: {}", record.id, summary),
        Err(e) => error!("❌ Failed to record audit entry {}: {}", summary, e),
    }
}

/// PostgreSQL backed audit log
#[derive(Debug, Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    /// Wrap a migrated pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PgAuditStore {
    #[instrument(level = "debug", skip_all, fields(action = %entry.action))]
    async fn record(&self, entry: NewAuditEntry) -> AuditResult<AuditRecord> {
        let record = sqlx::query_as::<_, AuditRecord>(
            r#"
            INSERT INTO backup_restore_logs (action, file_path, tables, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, action, file_path, date, tables, status
            "#,
        )
        .bind(entry.action.as_str())
        .bind(entry.file_path.as_str())
        .bind(entry.tables_column())
        .bind(entry.status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    #[instrument(level = "debug", skip_all)]
    async fn list(&self) -> AuditResult<Vec<AuditRecord>> {
        let records = sqlx::query_as::<_, AuditRecord>(
            r#"
            SELECT id, action, file_path, date, tables, status
            FROM backup_restore_logs
            ORDER BY date DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

/// Records kept by [`MemoryAuditStore::new`]
pub const DEFAULT_MEMORY_CAPACITY: usize = 1000;

/// In-process audit log
///
/// Holds at most `capacity` records, dropping the oldest once full. Ids keep
/// increasing across evictions.
#[derive(Debug)]
pub struct MemoryAuditStore {
    capacity: usize,
    inner: RwLock<MemoryRecords>,
}

#[derive(Debug, Default)]
struct MemoryRecords {
    records: VecDeque<AuditRecord>,
    last_id: i32,
}

impl MemoryAuditStore {
    /// Create an empty log keeping [`DEFAULT_MEMORY_CAPACITY`] records
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }

    /// Create an empty log keeping at most `capacity` records (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: RwLock::new(MemoryRecords::default()),
        }
    }

    /// Maximum number of records kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditStore {
    async fn record(&self, entry: NewAuditEntry) -> AuditResult<AuditRecord> {
        let mut inner = self.inner.write().await;
        inner.last_id = inner.last_id.saturating_add(1);
        let record = AuditRecord {
            id: inner.last_id,
            action: entry.action,
            file_path: entry.file_path.clone(),
            date: Utc::now(),
            tables: entry.tables_column(),
            status: entry.status,
        };
        while inner.records.len() >= self.capacity {
            inner.records.pop_front();
        }
        inner.records.push_back(record.clone());
        Ok(record)
    }

    async fn list(&self) -> AuditResult<Vec<AuditRecord>> {
        Ok(self.inner.read().await.records.iter().rev().cloned().collect())
    }
}
