//! Fault taxonomy for chunk validation.

use thiserror::Error;

/// Result alias for fallible chunk operations.
pub type Result<T> = std::result::Result<T, ChunkFault>;

/// The three independent ways a chunk handle can fail validation.
///
/// The distinction is the point of the design: `Corrupted` says "this
/// handle is garbage or already freed", while `Modified` says "this chunk
/// is fine but its content changed since it was last declared trustworthy".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChunkFault {
    /// The handle lies outside the range of chunks this heap ever backed.
    #[error("handle outside heap bounds")]
    OutOfRange,
    /// Header or sentinel seal is broken: the chunk was freed, the handle
    /// is foreign, or a write ran past the chunk entirely.
    #[error("structural seal broken")]
    Corrupted,
    /// Structure intact, but payload bytes no longer match the checksum
    /// stamped at the last checkpoint.
    #[error("payload modified since last checkpoint")]
    Modified,
}
