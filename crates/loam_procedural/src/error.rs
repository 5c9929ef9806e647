//! # World Error Types
//!
//! Failures of persistence and configuration. None of these ever reach
//! gameplay: the world logs them and carries on.

use std::path::PathBuf;

use thiserror::Error;

use loam_core::{ChunkCoord, ChunkError};

/// Errors that can occur in the world layer.
#[derive(Error, Debug)]
pub enum WorldError {
    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A metadata document could not be parsed.
    #[error("invalid world metadata: {0}")]
    Config(#[from] toml::de::Error),

    /// A chunk file had the wrong length.
    #[error("malformed chunk file for ({}, {}, {}): {source}", coord.x, coord.y, coord.z)]
    MalformedChunk {
        /// Chunk the file belongs to.
        coord: ChunkCoord,
        /// What was wrong with it.
        #[source]
        source: ChunkError,
    },
}

impl WorldError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
