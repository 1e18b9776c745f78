//! dbkeeper application crate
//!
//! Version: 0.3.0
//!
//! Application configuration plus the two front ends of the `dbkeeper`
//! binary: one-shot command-line operations and the web application.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use dbkeeper_core::{BinlogConfig, CoreError, Engine, ToolPaths};
use dbkeeper_db::DatabaseConfig;
use dbkeeper_monitor::LoggingConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod clap;
pub mod commands;
pub mod server;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "DBKEEPER_CONFIG";

/// Prefix of configuration overrides in the environment, nested keys use `__`
pub const ENV_PREFIX: &str = "DBKEEPER_";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly named file does not exist
    #[error("Configuration file not found: {0}")]
    Missing(PathBuf),

    /// A provider returned invalid data
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] figment::Error),

    /// Values parsed but are unusable
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Web application bind address
    pub address: IpAddr,
    /// Web application port
    pub port: u16,
    /// Audit database, operations are kept in memory when unset
    pub database_url: Option<String>,
    /// Audit pool size
    pub max_connections: u32,
    /// Logging settings
    pub log: LoggingConfig,
    /// Directory for backups taken without an explicit output file
    pub backup_directory: PathBuf,
    /// Native tool locations
    pub tools: ToolPaths,
    /// MySQL binary log location
    pub binlog: BinlogConfig,
    /// Engine assumed by web forms that do not name one
    pub default_engine: Engine,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            database_url: None,
            max_connections: 5,
            log: LoggingConfig::default(),
            backup_directory: PathBuf::from("backups"),
            tools: ToolPaths::default(),
            binlog: BinlogConfig::default(),
            default_engine: Engine::Postgres,
        }
    }
}

impl Config {
    /// Providers in precedence order: defaults, TOML file, `DATABASE_URL`,
    /// then `DBKEEPER_*` variables
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database_url".into()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load the configuration from `path`, or from `DBKEEPER_CONFIG` when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        if let Some(path) = &path {
            if !path.is_file() {
                return Err(ConfigError::Missing(path.clone()));
            }
        }

        let config: Config = Self::figment(path.as_deref()).extract()?;
        config.tools.validate()?;
        Ok(config)
    }

    /// Audit database settings, when an audit database is configured
    pub fn audit_database(&self) -> Option<DatabaseConfig> {
        self.database_url.as_ref().map(|url| DatabaseConfig {
            url: url.clone(),
            max_connections: self.max_connections,
            ..DatabaseConfig::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_engine, Engine::Postgres);
        assert_eq!(config.tools, ToolPaths::default());
        assert!(config.audit_database().is_none());
    }

    #[test]
    fn test_toml_overrides_nested_tables() {
        let file = config_file(
            r#"
port = 9090
backup_directory = "/srv/backups"
default_engine = "mariadb"

[tools]
pg_dump = "/usr/lib/postgresql/16/bin/pg_dump"

[binlog]
directory = "/data/binlog"

[log]
log_level = "debug"
enable_file_logging = false
"#,
        );

        let config: Config = Config::figment(Some(file.path())).extract().unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.backup_directory, PathBuf::from("/srv/backups"));
        assert_eq!(config.default_engine, Engine::MySql);
        assert_eq!(config.tools.pg_dump, PathBuf::from("/usr/lib/postgresql/16/bin/pg_dump"));
        assert_eq!(config.tools.psql, PathBuf::from("psql"));
        assert_eq!(config.binlog.directory, PathBuf::from("/data/binlog"));
        assert_eq!(config.binlog.prefix, "mysql-bin");
        assert_eq!(config.log.log_level, "debug");
        assert!(!config.log.enable_file_logging);
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let err = Config::load(Some(Path::new("/nonexistent/dbkeeper.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_invalid_engine_is_rejected() {
        let file = config_file("default_engine = \"oracle\"\n");
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_empty_tool_path_is_rejected() {
        let file = config_file("[tools]\nmysql = \"\"\n");
        assert!(matches!(Config::load(Some(file.path())), Err(ConfigError::Core(_))));
    }

    #[test]
    fn test_audit_database_uses_pool_size() {
        let config = Config {
            database_url: Some("postgres://audit@localhost/audit".into()),
            max_connections: 2,
            ..Config::default()
        };
        let db = config.audit_database().unwrap();
        assert_eq!(db.url, "postgres://audit@localhost/audit");
        assert_eq!(db.max_connections, 2);
    }
}
