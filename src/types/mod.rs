//! Handle and call-site types shared across the crate.

pub mod checksum;

use std::fmt;
use std::panic::Location;

use serde::Serialize;

/// Opaque reference to one allocator-managed chunk.
///
/// Handles stay probeable for the life of the heap: the arena never
/// shrinks, so even a long-freed chunk can still be checked and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChunkHandle(pub(crate) u32);

impl ChunkHandle {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn raw(self) -> u64 {
        u64::from(self.0)
    }

    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw as u32)
    }
}

impl fmt::Display for ChunkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source location recorded at allocation, checkpoint, and unlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallSite {
    /// File that issued the operation.
    pub file: &'static str,
    /// Line within `file`.
    pub line: u32,
}

impl CallSite {
    /// Captures the caller's own source location.
    #[track_caller]
    pub fn here() -> Self {
        let loc = Location::caller();
        Self {
            file: loc.file(),
            line: loc.line(),
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.file, self.line)
    }
}
