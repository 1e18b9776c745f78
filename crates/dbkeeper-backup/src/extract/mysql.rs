//! Boundary detection for `mysqldump` output
//!
//! mysqldump quotes identifiers with backticks and writes one section per
//! table: an optional `-- Table structure for table` comment, the
//! `DROP TABLE`/`CREATE TABLE` statements, then the `INSERT` rows. Views,
//! stored routines and events get their own section comments, which end the
//! preceding table's block without starting a new one.

use std::sync::OnceLock;

use regex::bytes::Regex;

use super::{BoundaryDetector, Marker};

fn anchored_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r"(?m)^(?:(?:CREATE TABLE (?:IF NOT EXISTS )?|-- Table structure for table )",
            r"`([^`\r\n]+)`",
            r"|-- (?:Temporary view structure for view|Temporary table structure for view",
            r"|Final view structure for view|Dumping routines|Dumping events)\b)",
        ))
        .expect("static pattern")
    })
}

fn substring_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"CREATE TABLE(?: `([^`]*)`)?").expect("static pattern"))
}

/// Markers for mysqldump's backtick-quoted table sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MysqlDumpMarkers {
    anchored: bool,
}

impl MysqlDumpMarkers {
    /// Markers must start a line and name the table
    ///
    /// Row data containing `CREATE TABLE` mid-line is never taken for a
    /// boundary, and the section comment mysqldump writes before each table
    /// starts the block so its `DROP TABLE` travels with it.
    pub fn strict() -> Self {
        Self { anchored: true }
    }

    /// Every occurrence of `CREATE TABLE` anywhere in the text is a boundary
    ///
    /// Matches the plain substring search of earlier releases.
    pub fn legacy() -> Self {
        Self { anchored: false }
    }
}

impl Default for MysqlDumpMarkers {
    fn default() -> Self {
        Self::strict()
    }
}

impl BoundaryDetector for MysqlDumpMarkers {
    fn name(&self) -> &'static str {
        "mysqldump"
    }

    fn markers(&self, dump: &[u8]) -> Vec<Marker> {
        let pattern = if self.anchored { anchored_pattern() } else { substring_pattern() };

        pattern
            .captures_iter(dump)
            .filter_map(|caps| {
                let offset = caps.get(0)?.start();
                Some(match caps.get(1) {
                    Some(name) => Marker::table(offset, String::from_utf8_lossy(name.as_bytes())),
                    None => Marker::boundary(offset),
                })
            })
            .collect()
    }
}
