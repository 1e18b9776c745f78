//! Full and table-scoped restores
//!
//! A table-scoped restore reduces the dump with the engine's
//! [`BoundaryDetector`](crate::extract::BoundaryDetector) and imports the
//! reduced copy from a temporary file that is removed once the import is
//! over, whatever its outcome.

use std::io::Write;
use std::path::{Path, PathBuf};

use dbkeeper_core::{ConnectionParams, ToolPaths};
use tempfile::NamedTempFile;
use tracing::{info, instrument, warn};

use crate::error::{BackupError, BackupResult};
use crate::extract::{detector_for, extract};
use crate::process::{import_command, run};
use crate::utils::BackupUtils;

/// What to restore and where from
#[derive(Debug, Clone)]
pub struct RestoreRequest {
    /// Target database
    pub connection: ConnectionParams,
    /// Dump file to import
    pub input: PathBuf,
    /// Tables to restore, empty for the whole dump
    pub tables: Vec<String>,
    /// Directory for the filtered copy, the system temp dir when absent
    pub scratch_dir: Option<PathBuf>,
}

impl RestoreRequest {
    /// Full restore of `input`
    pub fn full(connection: ConnectionParams, input: impl Into<PathBuf>) -> Self {
        Self {
            connection,
            input: input.into(),
            tables: Vec::new(),
            scratch_dir: None,
        }
    }
}

/// Restore the whole dump, or only the requested tables when there are any
///
/// Returns the warnings of a table-scoped restore.
pub async fn restore(tools: &ToolPaths, request: &RestoreRequest) -> BackupResult<Vec<String>> {
    if request.tables.is_empty() {
        restore_database(tools, request).await?;
        Ok(Vec::new())
    } else {
        restore_tables(tools, request).await
    }
}

/// Import the whole dump into the target database
#[instrument(
    skip_all,
    fields(engine = %request.connection.engine, database = %request.connection.database)
)]
pub async fn restore_database(tools: &ToolPaths, request: &RestoreRequest) -> BackupResult<()> {
    BackupUtils::require_input(&request.input)?;
    info!("🔄 Restoring {} into {}", request.input.display(), request.connection.database);

    import(tools, &request.connection, &request.input).await?;

    info!("✅ Restore of {} completed", request.connection.database);
    Ok(())
}

/// Import only the requested tables of the dump
///
/// Tables missing from the dump are reported as warnings. When none of them
/// exist nothing is imported.
#[instrument(
    skip_all,
    fields(engine = %request.connection.engine, database = %request.connection.database)
)]
pub async fn restore_tables(
    tools: &ToolPaths,
    request: &RestoreRequest,
) -> BackupResult<Vec<String>> {
    BackupUtils::require_input(&request.input)?;
    info!(
        "🔄 Restoring tables {} from {}",
        request.tables.join(","),
        request.input.display()
    );

    let (filtered, warnings) = prepare_filtered(request).await?;
    import(tools, &request.connection, filtered.path()).await?;
    drop(filtered);

    info!("✅ Table restore of {} completed", request.connection.database);
    Ok(warnings)
}

/// Write the reduced dump for `request` to a temporary file
///
/// The file is deleted when the returned handle is dropped.
pub async fn prepare_filtered(
    request: &RestoreRequest,
) -> BackupResult<(NamedTempFile, Vec<String>)> {
    let dump = tokio::fs::read(&request.input)
        .await
        .map_err(|source| BackupError::DumpUnreadable {
            path: request.input.clone(),
            source,
        })?;

    let detector = detector_for(request.connection.engine);
    let extraction = extract(&dump, &request.tables, detector.as_ref());
    for warning in &extraction.warnings {
        warn!("⚠️ {}", warning);
    }
    if extraction.is_empty() {
        return Err(BackupError::NoTablesMatched(request.tables.clone()));
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix("filtered_backup_").suffix(".sql");
    let mut file = match &request.scratch_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(&extraction.filtered)?;
    file.flush()?;

    info!(
        "🔧 Filtered dump {} holds {} of {} bytes",
        file.path().display(),
        extraction.filtered.len(),
        dump.len()
    );
    Ok((file, extraction.warnings))
}

async fn import(tools: &ToolPaths, conn: &ConnectionParams, input: &Path) -> BackupResult<()> {
    run(&import_command(tools, conn, input)).await.map(|_| ())
}
