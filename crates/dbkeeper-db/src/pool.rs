//! Database connection pool management for dbkeeper
//!
//! Version: 0.3.0

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, instrument};

use crate::error::AuditResult;
use crate::DatabaseConfig;

/// Create a raw SQLx connection pool
#[instrument(level = "debug", skip_all, fields(max_connections = config.max_connections))]
pub async fn create_pool(config: &DatabaseConfig) -> AuditResult<PgPool> {
    debug!("🔧 Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(&config.url)
        .await?;

    info!("✅ Created database connection pool with {} max connections", config.max_connections);
    Ok(pool)
}

/// Check if the database connection pool is healthy
#[instrument(level = "debug", skip_all)]
pub async fn check_pool_health(pool: &PgPool) -> AuditResult<bool> {
    let result = sqlx::query("SELECT 1").execute(pool).await?;
    let is_healthy = result.rows_affected() == 1;
    debug!("🔧 Database connection pool health check: {}", is_healthy);
    Ok(is_healthy)
}
