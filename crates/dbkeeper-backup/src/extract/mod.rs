//! Table extraction from SQL dumps
//!
//! Reduces a full dump to the statements of a chosen set of tables so the
//! result can be fed to the engine's import client. The dump is treated as
//! opaque text: a preamble of session setup statements followed by per-table
//! blocks. Where one block ends and the next begins is decided by a
//! [`BoundaryDetector`], one implementation per dump format, so format drift
//! between tool versions stays inside that implementation.
//!
//! The preamble is always copied verbatim. Blocks are appended in the order
//! the tables were requested, not in dump order. A table that cannot be found
//! produces a warning instead of an error.

mod mysql;
mod postgres;

use std::collections::HashSet;
use std::ops::Range;

use dbkeeper_core::Engine;
use tracing::{debug, instrument, warn};

pub use mysql::MysqlDumpMarkers;
pub use postgres::PgDumpMarkers;

/// A block boundary found in a dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Byte offset where the block starts
    pub offset: usize,
    /// Table owning the block, `None` for blocks that belong to no table
    pub table: Option<String>,
}

impl Marker {
    /// Marker for a block owned by `table`
    pub fn table(offset: usize, table: impl Into<String>) -> Self {
        Self { offset, table: Some(table.into()) }
    }

    /// Marker that only ends the previous block
    pub fn boundary(offset: usize) -> Self {
        Self { offset, table: None }
    }
}

/// Finds table block boundaries in one dump format
pub trait BoundaryDetector: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// All markers in the dump, sorted by offset
    fn markers(&self, dump: &[u8]) -> Vec<Marker>;

    /// Whether a block owned by `block_table` satisfies a request for `requested`
    fn matches(&self, block_table: &str, requested: &str) -> bool {
        block_table == requested
    }

    /// Whether a table may own several separate blocks
    ///
    /// When false only the first matching block is extracted.
    fn multi_block(&self) -> bool {
        false
    }
}

/// Default boundary detector for the dumps an engine's export tool writes
pub fn detector_for(engine: Engine) -> Box<dyn BoundaryDetector> {
    match engine {
        Engine::MySql => Box::new(MysqlDumpMarkers::strict()),
        Engine::Postgres => Box::new(PgDumpMarkers),
    }
}

/// A contiguous block of the dump and its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Owning table
    pub table: Option<String>,
    /// Byte range in the dump
    pub range: Range<usize>,
}

/// Split a dump into blocks
///
/// Consecutive markers naming the same table stay in one block. The last
/// block runs to the end of the dump. Bytes before the first block are the
/// preamble and are not part of any block.
pub fn split_blocks(dump: &[u8], detector: &dyn BoundaryDetector) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();

    for marker in detector.markers(dump) {
        if marker.offset >= dump.len() {
            continue;
        }
        if let Some(current) = blocks.last_mut() {
            if marker.offset <= current.range.start {
                continue;
            }
            if current.table.is_some() && current.table == marker.table {
                continue;
            }
            current.range.end = marker.offset;
        }
        blocks.push(Block {
            table: marker.table,
            range: marker.offset..dump.len(),
        });
    }

    blocks
}

/// Result of an extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Preamble followed by the requested blocks
    pub filtered: Vec<u8>,
    /// One entry per requested table that was not found
    pub warnings: Vec<String>,
    matched: Vec<String>,
}

impl Extraction {
    /// Requested tables that produced at least one block, in request order
    pub fn matched(&self) -> &[String] {
        &self.matched
    }

    /// Whether no requested table was found
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }
}

/// Extract the preamble plus the blocks of `tables` from `dump`
///
/// Requesting the same table twice extracts it once.
#[instrument(
    level = "debug",
    skip_all,
    fields(detector = detector.name(), bytes = dump.len(), tables = tables.len())
)]
pub fn extract<S: AsRef<str>>(
    dump: &[u8],
    tables: &[S],
    detector: &dyn BoundaryDetector,
) -> Extraction {
    let blocks = split_blocks(dump, detector);
    let preamble_end = blocks.first().map_or(dump.len(), |b| b.range.start);
    debug!("🔧 Found {} table blocks, preamble is {} bytes", blocks.len(), preamble_end);

    let mut filtered = Vec::with_capacity(dump.len());
    filtered.extend_from_slice(&dump[..preamble_end]);

    let mut seen = HashSet::new();
    let mut matched = Vec::new();
    let mut warnings = Vec::new();

    for requested in tables {
        let requested = requested.as_ref();
        if !seen.insert(requested) {
            debug!("Table {} requested more than once", requested);
            continue;
        }

        let mut owned = blocks.iter().filter(|block| {
            block
                .table
                .as_deref()
                .is_some_and(|table| detector.matches(table, requested))
        });

        let mut found = false;
        if detector.multi_block() {
            for block in owned {
                filtered.extend_from_slice(&dump[block.range.clone()]);
                found = true;
            }
        } else if let Some(block) = owned.next() {
            filtered.extend_from_slice(&dump[block.range.clone()]);
            found = true;
        }

        if found {
            matched.push(requested.to_string());
        } else {
            let warning = format!("table {requested} not found in dump");
            warn!("⚠️ {}", warning);
            warnings.push(warning);
        }
    }

    Extraction { filtered, warnings, matched }
}
