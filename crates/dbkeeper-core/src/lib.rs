//! dbkeeper Core Library
//!
//! Version: 0.3.0
//! Date: 2026-10-16
//!
//! Fundamental types shared by every dbkeeper crate: the supported database
//! engines, connection parameters for the native client tools, and the tool
//! and binlog locations used when those tools are spawned.
//!
//! # Examples
//! ```rust
//! use dbkeeper_core::{ConnectionParams, Engine};
//!
//! let engine: Engine = "mariadb".parse().unwrap();
//! let conn = ConnectionParams::new(engine, "localhost", "root", "secret", "shop");
//! assert_eq!(conn.port, 3306);
//! ```

pub mod config;
pub mod error;
pub mod types;

pub use config::{BinlogConfig, ToolPaths};
pub use error::{CoreError, Result};
pub use types::{ConnectionParams, Engine};
