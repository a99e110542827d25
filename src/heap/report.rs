use std::fmt;

use serde::Serialize;

use crate::types::{CallSite, ChunkHandle};

/// Snapshot of every chunk the heap ever backed, most recent first.
///
/// Serializable for machine consumption; `Display` renders the classic
/// multi-line dump. Exact text is informational, the fields are the
/// contract.
#[derive(Debug, Clone, Serialize)]
pub struct HeapReport {
    /// Per-chunk rows, most recently created first.
    pub chunks: Vec<ChunkRow>,
}

impl HeapReport {
    /// Rows that are neither live-and-clean nor merely free.
    pub fn suspect_rows(&self) -> impl Iterator<Item = &ChunkRow> {
        self.chunks.iter().filter(|row| row.corrupted || row.modified)
    }
}

/// Diagnostic fields for one chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkRow {
    /// Handle of the chunk.
    pub handle: ChunkHandle,
    /// Requested payload length in bytes.
    pub len: usize,
    /// Power-of-two backing size.
    pub bucket: usize,
    /// The chunk has been unlinked.
    pub free: bool,
    /// Structural seal broken on a chunk not marked free.
    pub corrupted: bool,
    /// Structure intact but content changed since the last checkpoint.
    pub modified: bool,
    /// Where the chunk was allocated.
    pub allocated: CallSite,
    /// Last checkpoint site, present when it differs from the allocation
    /// site.
    pub last_checked: Option<CallSite>,
    /// Where the chunk was unlinked, when it has been.
    pub freed: Option<CallSite>,
}

impl fmt::Display for HeapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*** memory report ***")?;
        for row in &self.chunks {
            write!(f, "chunk: {} {} {}", row.handle, row.len, row.bucket)?;
            if row.free {
                write!(f, " free")?;
            }
            if row.corrupted {
                write!(f, " corrupted")?;
            }
            if row.modified {
                write!(f, " modified")?;
            }
            write!(f, " {}", row.allocated)?;
            if let Some(site) = row.last_checked {
                write!(f, " / checked {site}")?;
            }
            if let Some(site) = row.freed {
                write!(f, " / freed {site}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "*** end of report ***")
    }
}
