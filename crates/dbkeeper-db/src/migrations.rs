//! Database migrations for dbkeeper
//!
//! Each migration runs once and is recorded in `_migrations`.

use sqlx::postgres::PgPool;
use tracing::{debug, info, instrument};

use crate::error::AuditResult;

/// Ordered `(version, statement)` pairs
pub const MIGRATIONS: &[(&str, &str)] = &[
    (
        "20240301000000",
        r#"
        CREATE TABLE IF NOT EXISTS backup_restore_logs (
            id SERIAL PRIMARY KEY,
            action TEXT NOT NULL,
            file_path TEXT NOT NULL,
            date TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            tables TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL
        )
        "#,
    ),
    (
        "20240301000001",
        r#"
        CREATE INDEX IF NOT EXISTS backup_restore_logs_date_idx
            ON backup_restore_logs (date DESC)
        "#,
    ),
];

/// Run database migrations
#[instrument(level = "debug", skip_all)]
pub async fn run_migrations(pool: &PgPool) -> AuditResult<()> {
    debug!("🔧 Starting database migrations");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version TEXT PRIMARY KEY,
            applied_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    let mut applied = 0;
    for (version, statement) in MIGRATIONS {
        let mut tx = pool.begin().await?;
        let inserted = sqlx::query(
            "INSERT INTO _migrations (version) VALUES ($1) ON CONFLICT (version) DO NOTHING",
        )
        .bind(*version)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if inserted == 0 {
            continue;
        }
        sqlx::query(statement).execute(&mut *tx).await?;
        tx.commit().await?;
        applied += 1;
    }

    info!("✅ Database migrations completed ({} applied)", applied);
    Ok(())
}
