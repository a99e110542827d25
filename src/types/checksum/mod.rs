//! The additive payload checksum and the seal stamped around each chunk.

/// Incremental checksum over payload bytes.
pub trait Checksum {
    /// Clears accumulated state.
    fn reset(&mut self);
    /// Feeds bytes into the checksum.
    fn update(&mut self, bytes: &[u8]);
    /// Returns the current checksum value.
    fn finalize(&self) -> u32;
}

/// Plain additive byte sum.
///
/// Deliberately weak and fast: a self-consistency probe for catching stray
/// writes, not a collision-resistant digest.
#[derive(Debug, Default)]
pub struct AdditiveSum {
    sum: u32,
}

impl Checksum for AdditiveSum {
    fn reset(&mut self) {
        self.sum = 0;
    }

    fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.sum = self.sum.wrapping_add(u32::from(byte));
        }
    }

    fn finalize(&self) -> u32 {
        self.sum
    }
}

/// Tag carried by the seal of every live chunk.
pub const TAG_LIVE: u32 = 0x1234_5678;

/// Tag restamped into the header when a chunk is unlinked. Fails structural
/// checks on sight, which is what makes a freed handle detectable.
pub const TAG_FREED: u32 = 0xdead_bea7;

/// The (tag, checksum) pair stored in a chunk's header and repeated in its
/// trailing sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Seal {
    /// Structural tag, [`TAG_LIVE`] while the chunk is allocated.
    pub tag: u32,
    /// Checksum over the usable payload region plus the requested length.
    pub sum: u32,
}

/// Computes the live seal for a payload region and its requested length.
///
/// The sum covers every byte of the usable region, not just the first
/// `requested_len` bytes: a write that stays inside the bucket but runs
/// past the declared length must still flip content validity.
pub fn payload_seal(requested_len: usize, payload: &[u8]) -> Seal {
    let mut checksum = AdditiveSum::default();
    checksum.update(payload);
    Seal {
        tag: TAG_LIVE,
        sum: (requested_len as u32).wrapping_add(checksum.finalize()),
    }
}
