//! dbkeeper Backup Module
//!
//! Backup and restore through the engines' native tools:
//! - Full and table-scoped dumps (`mysqldump`, `pg_dump`)
//! - Full and table-scoped restores (`mysql`, `psql`)
//! - Point-in-time recovery from MySQL binary logs
//! - Cron-scheduled backups
//!
//! Table-scoped restores reduce an existing dump with the [`extract`] module.
//!
//! ```
//! use dbkeeper_backup::extract::{extract, MysqlDumpMarkers};
//!
//! let dump = b"SET NAMES utf8;\nCREATE TABLE `a` (id int);\nCREATE TABLE `b` (id int);\n";
//! let extraction = extract(dump, &["b"], &MysqlDumpMarkers::strict());
//! assert_eq!(extraction.filtered, b"SET NAMES utf8;\nCREATE TABLE `b` (id int);\n");
//! ```
//!
//! Version: 0.3.0

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backup;
pub mod error;
pub mod extract;
pub mod pitr;
pub mod process;
pub mod restore;
pub mod scheduler;
pub mod utils;

pub use backup::{backup_database, BackupOutcome, BackupRequest};
pub use error::{BackupError, BackupResult};
pub use pitr::point_in_time_restore;
pub use restore::{restore, restore_database, restore_tables, RestoreRequest};
pub use scheduler::{BackupJob, BackupScheduler, CronSchedule, ScheduledJob};
