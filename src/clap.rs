//! Command-line interface
//!
//! Version: 0.3.0
//!
//! Flag names and short forms are the ones operators already script
//! against: `-a commandline -e backup -d mysql -H db -u root -n shop -y shop.sql`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use dbkeeper_core::Engine;
use tracing::debug;

/// Returns the current version of the crate with extra info if supplied
///
/// Set the environment variable `DBKEEPER_VERSION_EXTRA` at build time to any
/// UTF-8 string to include it in parenthesis after the SemVer version, usually
/// a git commit hash.
///
/// # Examples
/// ```
/// use dbkeeper::clap::version;
///
/// assert!(version().starts_with(env!("CARGO_PKG_VERSION")));
/// ```
pub fn version() -> String {
    let cargo_pkg_version = env!("CARGO_PKG_VERSION");

    match option_env!("DBKEEPER_VERSION_EXTRA") {
        Some(x) => format!("{} ({})", cargo_pkg_version, x),
        None => cargo_pkg_version.to_owned(),
    }
}

/// How the binary runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ApplicationType {
    /// Serve the web frontend
    Application,
    /// Perform one operation, or run a backup schedule
    Commandline,
}

/// Operation performed in command-line mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ActionType {
    /// Dump a database or a set of tables
    Backup,
    /// Load a dump, optionally only some of its tables
    Restore,
    /// Restore a base dump and replay binary logs up to `--date`
    #[value(alias = "pittest")]
    Pitr,
}

/// dbkeeper - backup and restore for MySQL/MariaDB and PostgreSQL
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[clap(about, version, name = "dbkeeper")]
pub struct Args {
    /// Run as web application or command-line tool
    #[clap(short = 'a', long = "applicationtype", value_enum)]
    pub application_type: ApplicationType,

    /// Database engine (mysql, mariadb, postgresql)
    #[clap(short = 'd', long = "dbtype")]
    pub db_type: Option<Engine>,

    /// Database user
    #[clap(short, long, default_value = "")]
    pub username: String,

    /// Database password
    #[clap(short, long, default_value = "", env = "DBKEEPER_DB_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Database host
    #[clap(short = 'H', long, default_value = "localhost")]
    pub host: String,

    /// Database port, the engine default when omitted
    #[clap(short = 'o', long)]
    pub port: Option<u16>,

    /// Database name
    #[clap(short = 'n', long = "dbname", default_value = "")]
    pub db_name: String,

    /// Tables to back up or restore, comma-separated or repeated
    #[clap(short, long, value_delimiter = ',')]
    pub tables: Vec<String>,

    /// Operation to perform
    #[clap(short = 'e', long = "actiontype", value_enum)]
    pub action_type: Option<ActionType>,

    /// Point-in-time target, `YYYY-MM-DDTHH:MM:SS`
    #[clap(short = 'r', long)]
    pub date: Option<String>,

    /// Dump file to restore from
    #[clap(short, long = "inputfile")]
    pub input_file: Option<PathBuf>,

    /// Dump file to write
    #[clap(short = 'y', long = "outputfile")]
    pub output_file: Option<PathBuf>,

    /// Cron expression for recurring backups, e.g. `0 0 * * *`
    #[clap(short, long)]
    pub schedule: Option<String>,

    /// Stop the schedule after its first backup
    #[clap(long, requires = "schedule")]
    pub once: bool,

    /// Path to configuration file
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Log level override
    #[clap(short, long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Requested tables with blanks removed, in command-line order
    pub fn table_list(&self) -> Vec<String> {
        self.tables
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Parse command line arguments into structured data
pub fn parse() -> Args {
    let args = Args::parse();
    debug!("✅ Command line arguments parsed");
    args
}
