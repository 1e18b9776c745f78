//! Utility functions for dbkeeper backup operations
//!
//! Backup directory validation and default file naming.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use super::error::{BackupError, BackupResult};

/// Utility functions for backup operations
pub struct BackupUtils;

impl BackupUtils {
    /// Validate and create backup directory if needed
    pub fn validate_backup_dir(path: &Path) -> BackupResult<()> {
        if !path.exists() {
            info!("📂 Creating backup directory at {:?}", path);
            fs::create_dir_all(path)?;
        } else if !path.is_dir() {
            return Err(BackupError::other(format!(
                "backup path is not a directory: {}",
                path.display()
            )));
        }

        let check_file = path.join(".permission_test");
        fs::write(&check_file, "test")?;
        fs::remove_file(&check_file)?;

        Ok(())
    }

    /// `<dir>/<db>_backup_<YYYYmmdd_HHMMSS>.sql`
    ///
    /// A table subset is named `<db>_tables_backup_<YYYYmmdd_HHMMSS>.sql`.
    pub fn default_output_path(
        dir: &Path,
        database: &str,
        table_scoped: bool,
        at: DateTime<Local>,
    ) -> PathBuf {
        let kind = if table_scoped { "tables_backup" } else { "backup" };
        dir.join(format!("{}_{}_{}.sql", database, kind, at.format("%Y%m%d_%H%M%S")))
    }

    /// Ensure the input file of a restore exists
    pub fn require_input(path: &Path) -> BackupResult<()> {
        if path.is_file() {
            Ok(())
        } else {
            Err(BackupError::InputNotFound(path.to_path_buf()))
        }
    }
}
