//! Full and table-scoped database backups
//!
//! The export tool's standard output is streamed straight into the backup
//! file.

use std::path::{Path, PathBuf};

use chrono::Local;
use dbkeeper_core::{ConnectionParams, ToolPaths};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::BackupResult;
use crate::process::{dump_command, run_to_file};
use crate::utils::BackupUtils;

/// What to back up and where
#[derive(Debug, Clone)]
pub struct BackupRequest {
    /// Source database
    pub connection: ConnectionParams,
    /// Destination file, generated inside the backup directory when absent
    pub output: Option<PathBuf>,
    /// Tables to export, empty for the whole database
    pub tables: Vec<String>,
}

impl BackupRequest {
    /// Full backup to a generated file name
    pub fn full(connection: ConnectionParams) -> Self {
        Self {
            connection,
            output: None,
            tables: Vec::new(),
        }
    }
}

/// A completed backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupOutcome {
    /// Written dump file
    pub path: PathBuf,
    /// Size of the dump in bytes
    pub bytes: u64,
}

/// Run the export tool for `request`, writing the dump to disk
#[instrument(
    skip_all,
    fields(engine = %request.connection.engine, database = %request.connection.database)
)]
pub async fn backup_database(
    tools: &ToolPaths,
    request: &BackupRequest,
    backup_dir: &Path,
) -> BackupResult<BackupOutcome> {
    let conn = &request.connection;
    info!(
        "💾 Starting backup of {} database {} ({} tables)",
        conn.engine,
        conn.database,
        if request.tables.is_empty() { "all".to_string() } else { request.tables.join(",") }
    );

    let path = match &request.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            path.clone()
        }
        None => {
            BackupUtils::validate_backup_dir(backup_dir)?;
            let table_scoped = !request.tables.is_empty();
            BackupUtils::default_output_path(backup_dir, &conn.database, table_scoped, Local::now())
        }
    };

    let cmd = dump_command(tools, conn, &request.tables);
    let bytes = run_to_file(&cmd, &path).await?;

    info!("✅ Backup written to {} ({} bytes)", path.display(), bytes);
    Ok(BackupOutcome { path, bytes })
}
