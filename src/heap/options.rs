use crate::heap::chunk::{HEADER_SIZE, SENTINEL_SIZE};

/// Tuning knobs for a [`GuardedHeap`](crate::heap::GuardedHeap).
#[derive(Debug, Clone)]
pub struct HeapOptions {
    /// Smallest bucket size a chunk may occupy. Must be a power of two with
    /// room for header and sentinel.
    pub min_bucket: usize,
    /// Scrub recycled backing bytes before handing them out again. Off by
    /// default: recycled chunks expose whatever the previous owner wrote.
    pub zero_on_reuse: bool,
    /// Arena slots reserved up front.
    pub initial_capacity: usize,
}

impl Default for HeapOptions {
    fn default() -> Self {
        Self {
            min_bucket: 128,
            zero_on_reuse: false,
            initial_capacity: 0,
        }
    }
}

impl HeapOptions {
    /// Defaults plus recycled-byte scrubbing, for callers that must see
    /// zeroed payloads on every allocation, recycled or not.
    pub fn scrubbed() -> Self {
        Self {
            zero_on_reuse: true,
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) {
        assert!(
            self.min_bucket.is_power_of_two(),
            "min_bucket {} is not a power of two",
            self.min_bucket
        );
        assert!(
            self.min_bucket > HEADER_SIZE + SENTINEL_SIZE,
            "min_bucket {} leaves no usable payload space",
            self.min_bucket
        );
    }
}
