use tracing::{debug, trace, warn};

use crate::error::{ChunkFault, Result};
use crate::heap::chunk::{bucket_for, Chunk};
use crate::heap::free_list::FreeList;
use crate::heap::report::{ChunkRow, HeapReport};
use crate::heap::{ChunkAllocator, HeapOptions};
use crate::types::{CallSite, ChunkHandle};

/// The guarded allocator context.
///
/// All chunk state lives here: the arena (every chunk ever backed, never
/// shrinking), the free list, and the options. One value per independent
/// heap; operations run synchronously on the caller's thread with plain
/// `&mut` discipline.
#[derive(Debug)]
pub struct GuardedHeap {
    chunks: Vec<Chunk>,
    free_list: FreeList,
    options: HeapOptions,
}

impl GuardedHeap {
    /// Empty heap with default options.
    pub fn new() -> Self {
        Self::with_options(HeapOptions::default())
    }

    /// Empty heap with explicit options. Panics if the options are unusable.
    pub fn with_options(options: HeapOptions) -> Self {
        options.validate();
        Self {
            chunks: Vec::with_capacity(options.initial_capacity),
            free_list: FreeList::default(),
            options,
        }
    }

    /// Number of chunks the heap has ever backed; never decreases, freed
    /// chunks included.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks currently parked on the free list.
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Diagnostic snapshot over every chunk, most recently created first.
    ///
    /// Rows carry the handle, requested length, bucket size, the
    /// free/corrupted/modified status, and the recorded call sites. The
    /// rendered text is informational; the fields are the contract.
    pub fn report(&self) -> HeapReport {
        let chunks = self
            .chunks
            .iter()
            .enumerate()
            .rev()
            .map(|(index, chunk)| {
                let handle = ChunkHandle(index as u32);
                let structural = chunk.structurally_valid();
                let corrupted = !chunk.free && !structural;
                if corrupted {
                    warn!(%handle, "heap.report.corrupted");
                }
                ChunkRow {
                    handle,
                    len: chunk.len,
                    bucket: chunk.bucket,
                    free: chunk.free,
                    corrupted,
                    modified: structural && !chunk.content_valid(),
                    allocated: chunk.allocated,
                    last_checked: (chunk.last_checked != chunk.allocated)
                        .then_some(chunk.last_checked),
                    freed: chunk.freed,
                }
            })
            .collect();
        HeapReport { chunks }
    }

    fn structurally_sound(&self, handle: ChunkHandle) -> bool {
        self.chunks
            .get(handle.index())
            .map_or(false, Chunk::structurally_valid)
    }

    fn expect_sound(&self, handle: ChunkHandle, action: &str) -> &Chunk {
        assert!(
            self.structurally_sound(handle),
            "cannot {action} invalid chunk {handle}"
        );
        &self.chunks[handle.index()]
    }

    /// Depth-first cascade: children first, most recently linked first.
    fn release(&mut self, handle: ChunkHandle, site: CallSite) {
        let children = self.chunks[handle.index()].children.clone();
        for child in children {
            if self.structurally_sound(child) {
                self.release(child, site);
            }
        }
        let chunk = &mut self.chunks[handle.index()];
        chunk.mark_freed(site);
        let bucket = chunk.bucket;
        self.free_list.push(bucket, handle);
        debug!(%handle, bucket, "heap.unlink");
    }
}

impl Default for GuardedHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkAllocator for GuardedHeap {
    fn allocate(
        &mut self,
        parent: Option<ChunkHandle>,
        existing: Option<ChunkHandle>,
        element_size: usize,
        count: usize,
        site: CallSite,
    ) -> ChunkHandle {
        let requested = element_size * count;
        if let Some(parent) = parent {
            assert!(
                self.structurally_sound(parent),
                "cannot link under invalid chunk {parent}"
            );
        }

        let bucket = bucket_for(requested, self.options.min_bucket);
        let handle = match self.free_list.take_exact(bucket) {
            Some(handle) => {
                debug!(%handle, bucket, requested, "heap.reuse");
                let zero = self.options.zero_on_reuse;
                self.chunks[handle.index()].revive(requested, site, zero);
                handle
            }
            None => {
                let handle = ChunkHandle(self.chunks.len() as u32);
                debug!(%handle, bucket, requested, "heap.alloc");
                self.chunks.push(Chunk::new(bucket, requested, site));
                handle
            }
        };

        if let Some(parent) = parent {
            self.chunks[parent.index()].children.insert(0, handle);
        }

        if let Some(existing) = existing {
            assert!(
                self.structurally_sound(existing),
                "cannot resize invalid chunk {existing}"
            );
            let old = &self.chunks[existing.index()];
            let copied = old.len.min(requested);
            let bytes = old.data[..copied].to_vec();
            self.chunks[handle.index()].data[..copied].copy_from_slice(&bytes);
            self.checkpoint(handle, site);
            debug!(from = %existing, to = %handle, copied, "heap.resize");
            self.unlink(existing, site);
        }

        handle
    }

    fn is_valid(&self, handle: ChunkHandle) -> bool {
        self.verify(handle).is_ok()
    }

    fn verify(&self, handle: ChunkHandle) -> Result<()> {
        let chunk = self
            .chunks
            .get(handle.index())
            .ok_or(ChunkFault::OutOfRange)?;
        if !chunk.structurally_valid() {
            return Err(ChunkFault::Corrupted);
        }
        if !chunk.content_valid() {
            return Err(ChunkFault::Modified);
        }
        Ok(())
    }

    fn checkpoint(&mut self, handle: ChunkHandle, site: CallSite) {
        match self.chunks.get_mut(handle.index()) {
            Some(chunk) if chunk.structurally_valid() => {
                chunk.restamp(site);
                trace!(%handle, "heap.checkpoint");
            }
            _ => warn!(%handle, "heap.checkpoint.invalid_target"),
        }
    }

    fn unlink(&mut self, handle: ChunkHandle, site: CallSite) -> Option<ChunkHandle> {
        if self.structurally_sound(handle) {
            self.release(handle, site);
        }
        None
    }

    fn payload(&self, handle: ChunkHandle) -> &[u8] {
        &self.expect_sound(handle, "read payload of").data
    }

    fn payload_mut(&mut self, handle: ChunkHandle) -> &mut [u8] {
        assert!(
            self.structurally_sound(handle),
            "cannot write payload of invalid chunk {handle}"
        );
        &mut self.chunks[handle.index()].data
    }

    fn requested_len(&self, handle: ChunkHandle) -> usize {
        self.expect_sound(handle, "take length of").len
    }
}
