//! Chunk lifecycle: guarded allocation, exact-bucket recycling, resize, and
//! cascading release.
//!
//! Every chunk carries a seal (tag + checksum) in its header and a copy in
//! its trailing sentinel. Three validity gates apply to any handle, each
//! independently meaningful: in-range (the heap ever backed it), structural
//! (seals intact and in agreement), and content (current bytes match the
//! last checkpointed checksum).

mod arena;
mod chunk;
mod free_list;
mod options;
mod report;

pub use arena::GuardedHeap;
pub use options::HeapOptions;
pub use report::{ChunkRow, HeapReport};

use crate::error::Result;
use crate::types::{CallSite, ChunkHandle};

/// The allocator operation surface.
///
/// One concrete implementation exists, [`GuardedHeap`]; the trait is the
/// seam that consumers such as [`IndexedTable`](crate::table::IndexedTable)
/// program against.
pub trait ChunkAllocator {
    /// Allocates a chunk, recycling an exact-bucket free chunk when one
    /// exists.
    ///
    /// The requested payload length is `element_size * count`. With a
    /// `parent`, the new chunk is linked under it and dies with it; the
    /// parent must be structurally valid or the call panics. With
    /// `existing`, this is a resize: `min(old, new)` payload bytes are
    /// copied over, the new chunk is checkpointed, and `existing` is
    /// unlinked along with its children. The returned handle is always
    /// distinct from `existing`.
    fn allocate(
        &mut self,
        parent: Option<ChunkHandle>,
        existing: Option<ChunkHandle>,
        element_size: usize,
        count: usize,
        site: CallSite,
    ) -> ChunkHandle;

    /// True iff the handle passes all three validity gates.
    fn is_valid(&self, handle: ChunkHandle) -> bool;

    /// Like [`is_valid`](Self::is_valid), but names the gate that failed.
    fn verify(&self, handle: ChunkHandle) -> Result<()>;

    /// Declares the current payload content the new trusted baseline,
    /// re-stamping header and sentinel. Ignored (with a warning) when the
    /// chunk is not structurally valid; corruption is never auto-healed.
    fn checkpoint(&mut self, handle: ChunkHandle, site: CallSite);

    /// Frees the chunk and, depth-first, every descendant linked under it,
    /// pushing each onto the free list. No effect on a structurally invalid
    /// handle. Always returns `None` so the caller can rebind its own
    /// binding in one step.
    fn unlink(&mut self, handle: ChunkHandle, site: CallSite) -> Option<ChunkHandle>;

    /// Read access to the chunk's full usable region, which may be larger
    /// than the requested length. Panics on a structurally invalid handle.
    fn payload(&self, handle: ChunkHandle) -> &[u8];

    /// Write access to the chunk's full usable region. Writes are untrusted
    /// until [`checkpoint`](Self::checkpoint) re-certifies them. Panics on
    /// a structurally invalid handle.
    fn payload_mut(&mut self, handle: ChunkHandle) -> &mut [u8];

    /// Declared payload length of the chunk. Panics on a structurally
    /// invalid handle.
    fn requested_len(&self, handle: ChunkHandle) -> usize;

    /// Fresh byte allocation under `parent`.
    fn alloc_bytes(
        &mut self,
        parent: Option<ChunkHandle>,
        len: usize,
        site: CallSite,
    ) -> ChunkHandle {
        self.allocate(parent, None, 1, len, site)
    }

    /// Duplicates `text` into a checkpointed chunk owned by `parent`.
    fn strdup(&mut self, parent: Option<ChunkHandle>, text: &str, site: CallSite) -> ChunkHandle {
        let handle = self.allocate(parent, None, 1, text.len(), site);
        self.payload_mut(handle)[..text.len()].copy_from_slice(text.as_bytes());
        self.checkpoint(handle, site);
        handle
    }
}
