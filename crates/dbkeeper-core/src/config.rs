//! Configuration module for dbkeeper
//!
//! Locations of the native client tools and of the MySQL binary logs used
//! during point-in-time recovery. Both are loaded as part of the application
//! configuration and can be overridden from the TOML file or environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Engine, Result};

/// Program names (or absolute paths) of the native client tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// MySQL/MariaDB export tool
    pub mysqldump: PathBuf,
    /// MySQL/MariaDB client used for imports
    pub mysql: PathBuf,
    /// MySQL/MariaDB binary log decoder
    pub mysqlbinlog: PathBuf,
    /// PostgreSQL export tool
    pub pg_dump: PathBuf,
    /// PostgreSQL client used for imports
    pub psql: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            mysqldump: PathBuf::from("mysqldump"),
            mysql: PathBuf::from("mysql"),
            mysqlbinlog: PathBuf::from("mysqlbinlog"),
            pg_dump: PathBuf::from("pg_dump"),
            psql: PathBuf::from("psql"),
        }
    }
}

impl ToolPaths {
    /// Export tool for an engine
    pub fn dump_tool(&self, engine: Engine) -> &PathBuf {
        match engine {
            Engine::MySql => &self.mysqldump,
            Engine::Postgres => &self.pg_dump,
        }
    }

    /// Import client for an engine
    pub fn client_tool(&self, engine: Engine) -> &PathBuf {
        match engine {
            Engine::MySql => &self.mysql,
            Engine::Postgres => &self.psql,
        }
    }

    /// Reject empty tool paths
    pub fn validate(&self) -> Result<()> {
        let tools = [
            ("mysqldump", &self.mysqldump),
            ("mysql", &self.mysql),
            ("mysqlbinlog", &self.mysqlbinlog),
            ("pg_dump", &self.pg_dump),
            ("psql", &self.psql),
        ];
        for (name, path) in tools {
            if path.as_os_str().is_empty() {
                return Err(CoreError::InvalidConfig(format!(
                    "tool path for {name} cannot be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Where MySQL binary logs live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinlogConfig {
    /// Directory holding the binlog files
    pub directory: PathBuf,
    /// Binlog base name, files are `<prefix>.<sequence>`
    pub prefix: String,
}

impl Default for BinlogConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/var/log/mysql"),
            prefix: "mysql-bin".to_string(),
        }
    }
}
