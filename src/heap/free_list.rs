use crate::types::ChunkHandle;

/// Freed chunks awaiting reuse.
///
/// Matching is exact-bucket-size only, found by linear scan; a request that
/// rounds to a different bucket always backs a fresh chunk instead.
#[derive(Debug, Default)]
pub(crate) struct FreeList {
    entries: Vec<(usize, ChunkHandle)>,
}

impl FreeList {
    pub fn push(&mut self, bucket: usize, handle: ChunkHandle) {
        self.entries.push((bucket, handle));
    }

    /// Removes and returns the first entry whose bucket size matches exactly.
    pub fn take_exact(&mut self, bucket: usize) -> Option<ChunkHandle> {
        let pos = self.entries.iter().position(|&(b, _)| b == bucket)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
