//! Core types for dbkeeper
//!
//! The engine selector and the connection parameters handed to the native
//! export/import tools.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CoreError;

/// Database engine family served by a set of native tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Engine {
    /// MySQL and MariaDB (`mysqldump`, `mysql`, `mysqlbinlog`)
    MySql,
    /// PostgreSQL (`pg_dump`, `psql`)
    Postgres,
}

impl Engine {
    /// Default server port for the engine
    pub fn default_port(self) -> u16 {
        match self {
            Engine::MySql => 3306,
            Engine::Postgres => 5432,
        }
    }

    /// Canonical lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Engine::MySql => "mysql",
            Engine::Postgres => "postgresql",
        }
    }
}

impl FromStr for Engine {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Engine::MySql),
            "postgresql" | "postgres" | "psql" => Ok(Engine::Postgres),
            _ => Err(CoreError::UnsupportedEngine(s.to_string())),
        }
    }
}

impl TryFrom<String> for Engine {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Engine> for String {
    fn from(engine: Engine) -> Self {
        engine.as_str().to_string()
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a native client tool needs to reach one database
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Engine family
    pub engine: Engine,
    /// Server host name or address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Login user
    pub username: String,
    /// Login password, only ever handed to a child process environment
    pub password: String,
    /// Database name
    pub database: String,
}

impl ConnectionParams {
    /// Build connection parameters using the engine's default port
    pub fn new(
        engine: Engine,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        let params = Self {
            engine,
            host: host.into(),
            port: engine.default_port(),
            username: username.into(),
            password: password.into(),
            database: database.into(),
        };
        debug!("🔧 Connection parameters for {} database '{}'", engine, params.database);
        params
    }

    /// Override the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[HIDDEN]")
            .field("database", &self.database)
            .finish()
    }
}
