//! Point-in-time recovery
//!
//! MySQL/MariaDB only: restore the base dump, then replay the server's
//! binary logs up to the target time through `mysqlbinlog | mysql`.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use dbkeeper_core::{BinlogConfig, ConnectionParams, Engine, ToolPaths};
use tracing::{debug, info, instrument};

use crate::error::{BackupError, BackupResult};
use crate::process::{binlog_replay_command, client_command, run_piped};
use crate::restore::{restore_database, RestoreRequest};
use crate::utils::BackupUtils;

/// Accepted format of a recovery target
pub const TARGET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a recovery target such as `2024-03-01T12:30:00`
pub fn parse_target(value: &str) -> BackupResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TARGET_FORMAT)
        .map_err(|_| BackupError::InvalidDate(value.to_string()))
}

/// Binary log files `<prefix>.<sequence>` in replay order
pub fn list_binlogs(config: &BinlogConfig) -> BackupResult<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(&config.directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BackupError::NoBinlogs(config.directory.clone()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut logs = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(sequence) = name
            .to_str()
            .and_then(|n| n.strip_prefix(config.prefix.as_str()))
            .and_then(|n| n.strip_prefix('.'))
            .filter(|seq| !seq.is_empty() && seq.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|seq| seq.parse::<u64>().ok())
        else {
            continue;
        };
        logs.push((sequence, entry.path()));
    }

    if logs.is_empty() {
        return Err(BackupError::NoBinlogs(config.directory.clone()));
    }
    logs.sort();
    debug!("🔧 Found {} binary logs in {}", logs.len(), config.directory.display());
    Ok(logs.into_iter().map(|(_, path)| path).collect())
}

/// Restore `base_backup` and replay binary logs up to `target`
#[instrument(skip_all, fields(engine = %conn.engine, database = %conn.database, target = %target))]
pub async fn point_in_time_restore(
    tools: &ToolPaths,
    binlog: &BinlogConfig,
    conn: &ConnectionParams,
    base_backup: &Path,
    target: &str,
) -> BackupResult<()> {
    let stop = parse_target(target)?;
    if conn.engine != Engine::MySql {
        return Err(BackupError::unsupported(format!(
            "point-in-time restore is not available for {}",
            conn.engine
        )));
    }
    BackupUtils::require_input(base_backup)?;
    let logs = list_binlogs(binlog)?;

    info!("⏪ Point-in-time restore of {} to {}", conn.database, stop);
    restore_database(tools, &RestoreRequest::full(conn.clone(), base_backup)).await?;

    info!("⏪ Replaying {} binary logs", logs.len());
    let replay = binlog_replay_command(tools, conn, stop, &logs);
    run_piped(&replay, &client_command(tools, conn)).await?;

    info!("✅ Database {} recovered to {}", conn.database, stop);
    Ok(())
}
