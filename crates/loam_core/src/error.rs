//! # Chunk Error Types
//!
//! Recoverable failures of chunk storage. Out-of-range voxel access is not
//! here: it is a sentinel read or an ignored write.

use thiserror::Error;

/// Errors that can occur when loading chunk data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// A serialized block grid had the wrong length.
    #[error("chunk payload has {actual} bytes, expected {expected}")]
    LengthMismatch {
        /// Exact byte count a chunk payload must have.
        expected: usize,
        /// Byte count that was supplied.
        actual: usize,
    },
}

/// Result type for chunk operations.
pub type ChunkResult<T> = Result<T, ChunkError>;
