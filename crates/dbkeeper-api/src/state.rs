//! Shared handler state

use std::path::PathBuf;
use std::sync::Arc;

use dbkeeper_core::{BinlogConfig, Engine, ToolPaths};
use dbkeeper_db::AuditLog;

/// Everything the handlers need, cloned per request
#[derive(Clone)]
pub struct AppState {
    /// Where operations are recorded
    pub audit: Arc<dyn AuditLog>,
    /// Native tool locations
    pub tools: Arc<ToolPaths>,
    /// MySQL binary log location for point-in-time restores
    pub binlog: Arc<BinlogConfig>,
    /// Directory for backups submitted without a file name
    pub backup_dir: PathBuf,
    /// Engine used when a form does not name one
    pub default_engine: Engine,
}

impl AppState {
    /// State with default tool locations and PostgreSQL as the form default
    pub fn new(audit: Arc<dyn AuditLog>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            audit,
            tools: Arc::new(ToolPaths::default()),
            binlog: Arc::new(BinlogConfig::default()),
            backup_dir: backup_dir.into(),
            default_engine: Engine::Postgres,
        }
    }

    /// Replace the tool locations
    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = Arc::new(tools);
        self
    }

    /// Replace the binary log location
    pub fn with_binlog(mut self, binlog: BinlogConfig) -> Self {
        self.binlog = Arc::new(binlog);
        self
    }

    /// Replace the form default engine
    pub fn with_default_engine(mut self, engine: Engine) -> Self {
        self.default_engine = engine;
        self
    }
}
