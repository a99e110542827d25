use smallvec::SmallVec;

use crate::types::checksum::{payload_seal, Seal, TAG_FREED, TAG_LIVE};
use crate::types::{CallSite, ChunkHandle};

/// Bytes accounted to the header when rounding to a bucket size.
pub(crate) const HEADER_SIZE: usize = 64;

/// Bytes accounted to the trailing sentinel.
pub(crate) const SENTINEL_SIZE: usize = 8;

/// Smallest power of two that fits header, sentinel, and `requested` payload
/// bytes, never below `floor`.
pub(crate) fn bucket_for(requested: usize, floor: usize) -> usize {
    (HEADER_SIZE + SENTINEL_SIZE + requested)
        .next_power_of_two()
        .max(floor)
}

/// Usable payload span of a bucket, the region a client may touch.
pub(crate) fn usable_size(bucket: usize) -> usize {
    bucket - HEADER_SIZE - SENTINEL_SIZE
}

/// One arena entry: seal header, backing bytes, trailing sentinel, and the
/// bookkeeping the diagnostic report draws from.
#[derive(Debug)]
pub(crate) struct Chunk {
    pub seal: Seal,
    /// Requested payload length; may be smaller than `data.len()`.
    pub len: usize,
    /// Power-of-two backing size used for free-list matching.
    pub bucket: usize,
    pub allocated: CallSite,
    pub last_checked: CallSite,
    pub freed: Option<CallSite>,
    /// Child chunks, most recently linked first.
    pub children: SmallVec<[ChunkHandle; 4]>,
    pub free: bool,
    /// The usable region, `bucket - HEADER_SIZE - SENTINEL_SIZE` bytes.
    pub data: Vec<u8>,
    /// Copy of the header seal, trailing the payload.
    pub sentinel: Seal,
}

impl Chunk {
    /// Fresh zeroed chunk, sealed and sited.
    pub fn new(bucket: usize, requested: usize, site: CallSite) -> Self {
        let data = vec![0u8; usable_size(bucket)];
        let seal = payload_seal(requested, &data);
        Self {
            seal,
            len: requested,
            bucket,
            allocated: site,
            last_checked: site,
            freed: None,
            children: SmallVec::new(),
            free: false,
            data,
            sentinel: seal,
        }
    }

    /// Brings a recycled chunk back into service. The backing bytes are left
    /// as the previous owner wrote them unless `zero` is set.
    pub fn revive(&mut self, requested: usize, site: CallSite, zero: bool) {
        debug_assert_eq!(self.data.len(), usable_size(self.bucket));
        if zero {
            self.data.fill(0);
        }
        self.len = requested;
        self.allocated = site;
        self.last_checked = site;
        self.freed = None;
        self.children.clear();
        self.free = false;
        self.restamp(site);
    }

    /// Recomputes the seal over the current bytes and stamps it into header
    /// and sentinel, recording `site` as the last-checked location.
    pub fn restamp(&mut self, site: CallSite) {
        let seal = payload_seal(self.len, &self.data);
        self.seal = seal;
        self.sentinel = seal;
        self.last_checked = site;
    }

    /// Header and sentinel tags intact and in agreement.
    pub fn structurally_valid(&self) -> bool {
        self.seal.tag == TAG_LIVE
            && self.sentinel.tag == TAG_LIVE
            && self.seal.sum == self.sentinel.sum
    }

    /// Current bytes still match the checksum stamped at the last checkpoint.
    pub fn content_valid(&self) -> bool {
        payload_seal(self.len, &self.data).sum == self.seal.sum
    }

    /// Marks the chunk freed; the freed tag breaks structural validity.
    pub fn mark_freed(&mut self, site: CallSite) {
        self.free = true;
        self.freed = Some(site);
        self.seal.tag = TAG_FREED;
    }
}
