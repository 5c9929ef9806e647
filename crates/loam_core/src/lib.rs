//! # LOAM Core
//!
//! The authoritative voxel data model shared by generation and the world.
//!
//! ## Architecture Rules
//!
//! 1. **Floor semantics** - World coordinates map to chunks with floor
//!    division, so negative positions land in negative chunks
//! 2. **Sentinels, not errors** - Reading outside a chunk returns air,
//!    writing outside a chunk does nothing
//! 3. **One lock per chunk** - Voxel grids sit behind a reader-writer lock
//!    scoped to the chunk instance
//!
//! ## Example
//!
//! ```rust,ignore
//! use loam_core::{world_to_chunk, Block, Chunk};
//!
//! let (coord, local) = world_to_chunk(-1, 70, 33);
//! let chunk = Chunk::new(coord);
//! chunk.set_block(local.x, local.y, local.z, Block::STONE);
//! assert!(chunk.needs_save());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod block;
pub mod chunk;
pub mod coords;
pub mod error;

pub use block::{Block, LIQUID_FULL};
pub use chunk::{Chunk, ChunkData, ChunkReadGuard, ChunkStats};
pub use coords::{
    chunk_to_world, world_to_chunk, ChunkCoord, Face, LocalPos, CHUNK_HEIGHT, CHUNK_SIZE,
    CHUNK_VOLUME,
};
pub use error::{ChunkError, ChunkResult};
