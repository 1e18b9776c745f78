//! Request handlers for the dbkeeper web frontend
//!
//! Form posts run the operation, record it in the audit log and redirect
//! back to the index page whatever the outcome.

use std::path::PathBuf;

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    Json,
};
use dbkeeper_backup::{
    backup_database, point_in_time_restore, restore, BackupError, BackupRequest, BackupResult,
    RestoreRequest,
};
use dbkeeper_core::{ConnectionParams, Engine};
use dbkeeper_db::{record_or_log, AuditAction, AuditRecord, AuditStatus, NewAuditEntry};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("index.html");

/// Connection fields shared by both forms
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionFields {
    /// Engine name, the configured default when empty
    #[serde(rename = "dbType")]
    pub db_type: String,
    /// Server host
    #[serde(rename = "dbHost")]
    pub db_host: String,
    /// Server port, the engine default when empty or invalid
    #[serde(rename = "dbPort")]
    pub db_port: String,
    /// Login user
    #[serde(rename = "dbUsername")]
    pub db_username: String,
    /// Login password
    #[serde(rename = "dbPassword")]
    pub db_password: String,
    /// Database name
    pub databasename: String,
}

impl ConnectionFields {
    /// Connection parameters, resolving the engine and port fallbacks
    pub fn params(&self, default_engine: Engine) -> BackupResult<ConnectionParams> {
        let engine = match self.db_type.trim() {
            "" => default_engine,
            name => name.parse::<Engine>()?,
        };
        let params = ConnectionParams::new(
            engine,
            self.db_host.trim(),
            self.db_username.trim(),
            self.db_password.as_str(),
            self.databasename.trim(),
        );
        Ok(match self.db_port.trim().parse::<u16>() {
            Ok(port) => params.with_port(port),
            Err(_) => params,
        })
    }
}

/// `POST /backup` form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BackupForm {
    /// Connection fields
    #[serde(flatten)]
    pub connection: ConnectionFields,
    /// Destination file, generated when empty
    #[serde(rename = "backupFile")]
    pub backup_file: String,
    /// Comma-separated tables, empty for a full backup
    pub tables: String,
}

/// `POST /restore` form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RestoreForm {
    /// Connection fields
    #[serde(flatten)]
    pub connection: ConnectionFields,
    /// Dump file to restore
    #[serde(rename = "restoreFile")]
    pub restore_file: String,
    /// Recovery target `YYYY-MM-DDTHH:MM:SS`, empty for a plain restore
    #[serde(rename = "restoreDate")]
    pub restore_date: String,
    /// Comma-separated tables, empty for the whole dump
    pub tables: String,
}

/// Split a comma-separated table list, dropping blanks
pub fn parse_table_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Server status
    pub status: String,
    /// Server version
    pub version: String,
}

/// Health check handler
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (StatusCode::OK, Json(response))
}

/// Index page with the backup and restore forms
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Audit log, newest first
pub async fn logs(State(state): State<AppState>) -> Result<Json<Vec<AuditRecord>>, ApiError> {
    Ok(Json(state.audit.list().await?))
}

fn report<T>(action: AuditAction, result: &BackupResult<T>) -> AuditStatus {
    match result {
        Ok(_) => info!("✅ {} succeeded", action),
        Err(e) => error!("❌ {} failed: {}", action, e),
    }
    AuditStatus::of(result)
}

async fn run_backup(
    state: &AppState,
    form: &BackupForm,
    tables: &[String],
) -> BackupResult<PathBuf> {
    let request = BackupRequest {
        connection: form.connection.params(state.default_engine)?,
        output: Some(form.backup_file.trim())
            .filter(|f| !f.is_empty())
            .map(PathBuf::from),
        tables: tables.to_vec(),
    };
    let outcome = backup_database(&state.tools, &request, &state.backup_dir).await?;
    Ok(outcome.path)
}

/// Backup form handler
pub async fn backup(State(state): State<AppState>, Form(form): Form<BackupForm>) -> Redirect {
    let tables = parse_table_list(&form.tables);
    let result = run_backup(&state, &form, &tables).await;
    let status = report(AuditAction::Backup, &result);

    let file_path = match &result {
        Ok(path) => path.display().to_string(),
        Err(_) => form.backup_file.trim().to_string(),
    };
    record_or_log(
        state.audit.as_ref(),
        NewAuditEntry::new(AuditAction::Backup, file_path, &tables, status),
    )
    .await;
    Redirect::to("/")
}

async fn run_restore(state: &AppState, form: &RestoreForm, tables: &[String]) -> BackupResult<()> {
    let connection = form.connection.params(state.default_engine)?;
    let input = PathBuf::from(form.restore_file.trim());
    let target = form.restore_date.trim();

    if !target.is_empty() {
        if !tables.is_empty() {
            return Err(BackupError::unsupported("point-in-time restore of a table subset"));
        }
        return point_in_time_restore(&state.tools, &state.binlog, &connection, &input, target)
            .await;
    }

    let request = RestoreRequest {
        connection,
        input,
        tables: tables.to_vec(),
        scratch_dir: None,
    };
    for warning in restore(&state.tools, &request).await? {
        warn!("⚠️ {}", warning);
    }
    Ok(())
}

/// Restore form handler
pub async fn restore_handler(
    State(state): State<AppState>,
    Form(form): Form<RestoreForm>,
) -> Redirect {
    let tables = parse_table_list(&form.tables);
    let result = run_restore(&state, &form, &tables).await;
    let status = report(AuditAction::Restore, &result);

    record_or_log(
        state.audit.as_ref(),
        NewAuditEntry::new(AuditAction::Restore, form.restore_file.trim(), &tables, status),
    )
    .await;
    Redirect::to("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_list() {
        assert_eq!(parse_table_list(""), Vec::<String>::new());
        assert_eq!(
            parse_table_list("users, orders,,"),
            vec!["users".to_string(), "orders".to_string()]
        );
    }

    #[test]
    fn test_connection_fallbacks() {
        let fields = ConnectionFields {
            db_host: "db".into(),
            db_port: "not-a-port".into(),
            db_username: "root".into(),
            databasename: "shop".into(),
            ..Default::default()
        };
        let params = fields.params(Engine::Postgres).unwrap();
        assert_eq!(params.engine, Engine::Postgres);
        assert_eq!(params.port, 5432);

        let fields = ConnectionFields {
            db_type: "mariadb".into(),
            db_port: "3307".into(),
            ..fields
        };
        let params = fields.params(Engine::Postgres).unwrap();
        assert_eq!(params.engine, Engine::MySql);
        assert_eq!(params.port, 3307);
    }

    #[test]
    fn test_unknown_engine_is_rejected() {
        let fields = ConnectionFields {
            db_type: "oracle".into(),
            ..Default::default()
        };
        assert!(fields.params(Engine::MySql).unwrap_err().is_config());
    }
}
