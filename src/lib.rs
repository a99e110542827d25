//! Debug-oriented memory management with structural seals and content
//! checksums.
//!
//! Every allocation lives in a guarded chunk: a header seal, the payload
//! bytes, and a trailing sentinel carrying a copy of the seal. A chunk can
//! be probed at any time for three independent failure modes: the handle is
//! not ours, the structure is broken (freed, foreign, or overrun), or the
//! content changed since the last [`checkpoint`](heap::ChunkAllocator::checkpoint).
//! Chunks form an ownership tree; unlinking a chunk cascades through its
//! descendants and recycles the whole subtree.
//!
//! [`table::IndexedTable`] is the canonical consumer: a string-keyed sorted
//! table whose rows, key copies, and iterator state all live in guarded
//! chunks.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod heap;
pub mod table;
pub mod types;

pub use error::{ChunkFault, Result};
pub use heap::{ChunkAllocator, ChunkRow, GuardedHeap, HeapOptions, HeapReport};
pub use table::{IndexedTable, TableIter};
pub use types::{CallSite, ChunkHandle};
