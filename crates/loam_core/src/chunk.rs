//! # Chunk Storage
//!
//! One chunk's voxel state: block ids, liquid levels and per-voxel
//! metadata, each a dense grid of `CHUNK_SIZE x CHUNK_HEIGHT x CHUNK_SIZE`
//! bytes.
//!
//! ## Layout
//!
//! Grids are flat and row-major, indexed as `[y][z][x]`:
//!
//! ```text
//! index = (y * CHUNK_SIZE + z) * CHUNK_SIZE + x
//! ```
//!
//! The serialized form is the block grid in exactly that order, no header.
//!
//! ## Thread Safety
//!
//! - All grids sit behind one `parking_lot::RwLock` owned by the chunk
//! - Readers run concurrently, writers are exclusive
//! - A write compares old and new values under the lock, so writing the
//!   value a voxel already holds never touches dirty or version state
//! - Flags and counters are atomics, readable without the lock

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{RwLock, RwLockReadGuard};

use crate::block::{Block, LIQUID_FULL};
use crate::coords::{ChunkCoord, CHUNK_HEIGHT, CHUNK_SIZE, CHUNK_VOLUME};
use crate::error::{ChunkError, ChunkResult};

/// Shared read access to a chunk's grids.
pub type ChunkReadGuard<'a> = RwLockReadGuard<'a, ChunkData>;

/// Flat index of a local position, `None` if any component is out of range.
#[inline]
fn voxel_index(x: i32, y: i32, z: i32) -> Option<usize> {
    let in_range = (0..CHUNK_SIZE as i32).contains(&x)
        && (0..CHUNK_HEIGHT as i32).contains(&y)
        && (0..CHUNK_SIZE as i32).contains(&z);
    if in_range {
        Some((y as usize * CHUNK_SIZE + z as usize) * CHUNK_SIZE + x as usize)
    } else {
        None
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// The three voxel grids of a chunk, without any locking.
///
/// Used directly by the generator while it owns the data exclusively, and
/// as the immutable snapshot type handed out by [`Chunk::snapshot`].
#[derive(Clone, PartialEq, Eq)]
pub struct ChunkData {
    blocks: Box<[Block]>,
    liquid: Box<[u8]>,
    metadata: Box<[u8]>,
}

impl ChunkData {
    /// Creates an all-air grid set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::AIR; CHUNK_VOLUME].into_boxed_slice(),
            liquid: vec![0; CHUNK_VOLUME].into_boxed_slice(),
            metadata: vec![0; CHUNK_VOLUME].into_boxed_slice(),
        }
    }

    /// Gets the block at local coordinates, air if out of range.
    #[inline]
    #[must_use]
    pub fn block(&self, x: i32, y: i32, z: i32) -> Block {
        voxel_index(x, y, z).map_or(Block::AIR, |i| self.blocks[i])
    }

    /// Sets the block at local coordinates.
    ///
    /// Returns true if the stored value changed.
    #[inline]
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: Block) -> bool {
        match voxel_index(x, y, z) {
            Some(i) if self.blocks[i] != block => {
                self.blocks[i] = block;
                true
            }
            _ => false,
        }
    }

    /// Gets the liquid level at local coordinates, 0 if out of range.
    #[inline]
    #[must_use]
    pub fn liquid(&self, x: i32, y: i32, z: i32) -> u8 {
        voxel_index(x, y, z).map_or(0, |i| self.liquid[i])
    }

    /// Sets the liquid level. Returns true if the stored value changed.
    #[inline]
    pub fn set_liquid(&mut self, x: i32, y: i32, z: i32, level: u8) -> bool {
        match voxel_index(x, y, z) {
            Some(i) if self.liquid[i] != level => {
                self.liquid[i] = level;
                true
            }
            _ => false,
        }
    }

    /// Gets the metadata byte at local coordinates, 0 if out of range.
    #[inline]
    #[must_use]
    pub fn metadata(&self, x: i32, y: i32, z: i32) -> u8 {
        voxel_index(x, y, z).map_or(0, |i| self.metadata[i])
    }

    /// Sets the metadata byte. Returns true if the stored value changed.
    #[inline]
    pub fn set_metadata(&mut self, x: i32, y: i32, z: i32, value: u8) -> bool {
        match voxel_index(x, y, z) {
            Some(i) if self.metadata[i] != value => {
                self.metadata[i] = value;
                true
            }
            _ => false,
        }
    }

    /// The block grid in serialization order.
    #[inline]
    #[must_use]
    pub fn block_slice(&self) -> &[Block] {
        &self.blocks
    }

    /// The liquid grid in the same order as the block grid.
    #[inline]
    #[must_use]
    pub fn liquid_slice(&self) -> &[u8] {
        &self.liquid
    }

    /// The metadata grid in the same order as the block grid.
    #[inline]
    #[must_use]
    pub fn metadata_slice(&self) -> &[u8] {
        &self.metadata
    }

    /// Serializes the block grid as raw bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice::<Block, u8>(&self.blocks).to_vec()
    }

    /// Replaces the block grid from raw bytes.
    ///
    /// Liquid levels are rebuilt from the blocks (full for water, empty
    /// otherwise) and metadata is cleared, since neither is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::LengthMismatch`] and leaves the data untouched
    /// if `bytes` is not exactly [`CHUNK_VOLUME`] long.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> ChunkResult<()> {
        if bytes.len() != CHUNK_VOLUME {
            return Err(ChunkError::LengthMismatch {
                expected: CHUNK_VOLUME,
                actual: bytes.len(),
            });
        }
        self.blocks.copy_from_slice(bytemuck::cast_slice::<u8, Block>(bytes));
        for (level, block) in self.liquid.iter_mut().zip(self.blocks.iter()) {
            *level = if block.is_liquid() { LIQUID_FULL } else { 0 };
        }
        self.metadata.fill(0);
        Ok(())
    }

    /// Y of the highest voxel in a column that is neither air nor the
    /// world-floor block.
    #[must_use]
    pub fn top_solid_y(&self, x: i32, z: i32) -> Option<i32> {
        (0..CHUNK_HEIGHT as i32).rev().find(|&y| {
            let block = self.block(x, y, z);
            !block.is_air() && !block.is_boundary()
        })
    }

    /// Counts voxels by category.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        let air = self.blocks.iter().filter(|b| b.is_air()).count();
        let liquid = self.liquid.iter().filter(|&&l| l > 0).count();
        (CHUNK_VOLUME - air, liquid, air)
    }
}

impl Default for ChunkData {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChunkData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (solid, liquid, air) = self.counts();
        f.debug_struct("ChunkData")
            .field("solid", &solid)
            .field("liquid", &liquid)
            .field("air", &air)
            .finish()
    }
}

/// Snapshot of a chunk's counters and flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Voxels that are not air.
    pub non_air_blocks: usize,
    /// Voxels with a liquid level above zero.
    pub liquid_cells: usize,
    /// Air voxels.
    pub air_blocks: usize,
    /// Mutation counter.
    pub version: u64,
    /// Has changes not yet picked up by a consumer.
    pub is_dirty: bool,
    /// Must be flushed to storage.
    pub needs_save: bool,
}

/// A chunk of world data.
///
/// Contains a 16x256x16 grid of voxels plus dirty/version bookkeeping.
pub struct Chunk {
    /// Chunk position in the world.
    coord: ChunkCoord,
    /// Voxel grids.
    data: RwLock<ChunkData>,
    /// Unsaved visual-relevant change.
    dirty: AtomicBool,
    /// Must be flushed to storage.
    needs_save: AtomicBool,
    /// Incremented on every effective mutation.
    version: AtomicU64,
    /// Milliseconds since the Unix epoch of the last mutation.
    last_modified: AtomicU64,
}

impl Chunk {
    /// Creates a new empty (all-air) clean chunk at the given coordinates.
    #[must_use]
    pub fn new(coord: ChunkCoord) -> Self {
        Self::from_data(coord, ChunkData::new())
    }

    /// Wraps existing grids in a clean chunk.
    #[must_use]
    pub fn from_data(coord: ChunkCoord, data: ChunkData) -> Self {
        Self {
            coord,
            data: RwLock::new(data),
            dirty: AtomicBool::new(false),
            needs_save: AtomicBool::new(false),
            version: AtomicU64::new(0),
            last_modified: AtomicU64::new(0),
        }
    }

    /// Chunk position in the world.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Moves the chunk to another coordinate.
    ///
    /// Needs exclusive ownership, so a chunk that is already shared
    /// through a world map cannot be relocated.
    pub fn relocate(&mut self, coord: ChunkCoord) {
        self.coord = coord;
        self.mark_dirty();
    }

    /// Gets a block at local coordinates.
    ///
    /// # Arguments
    ///
    /// * `x` - Local X (0-15)
    /// * `y` - Local Y (0-255)
    /// * `z` - Local Z (0-15)
    ///
    /// Out-of-range positions read as air.
    #[inline]
    #[must_use]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Block {
        self.data.read().block(x, y, z)
    }

    /// Sets a block at local coordinates.
    ///
    /// Out-of-range positions and writes of the current value are ignored.
    /// Returns true if the voxel changed.
    pub fn set_block(&self, x: i32, y: i32, z: i32, block: Block) -> bool {
        let mut data = self.data.write();
        let changed = data.set_block(x, y, z, block);
        if changed {
            self.mark_dirty();
        }
        changed
    }

    /// Gets the liquid level at local coordinates, 0 if out of range.
    #[inline]
    #[must_use]
    pub fn get_liquid(&self, x: i32, y: i32, z: i32) -> u8 {
        self.data.read().liquid(x, y, z)
    }

    /// Sets the liquid level. Returns true if the voxel changed.
    pub fn set_liquid(&self, x: i32, y: i32, z: i32, level: u8) -> bool {
        let mut data = self.data.write();
        let changed = data.set_liquid(x, y, z, level);
        if changed {
            self.mark_dirty();
        }
        changed
    }

    /// Gets the metadata byte at local coordinates, 0 if out of range.
    #[inline]
    #[must_use]
    pub fn get_metadata(&self, x: i32, y: i32, z: i32) -> u8 {
        self.data.read().metadata(x, y, z)
    }

    /// Sets the metadata byte. Returns true if the voxel changed.
    pub fn set_metadata(&self, x: i32, y: i32, z: i32, value: u8) -> bool {
        let mut data = self.data.write();
        let changed = data.set_metadata(x, y, z, value);
        if changed {
            self.mark_dirty();
        }
        changed
    }

    /// Acquires shared read access to the grids.
    ///
    /// Hold the guard only as long as needed: writers block on it.
    #[inline]
    pub fn read(&self) -> ChunkReadGuard<'_> {
        self.data.read()
    }

    /// Takes an immutable copy of all three grids.
    #[must_use]
    pub fn snapshot(&self) -> ChunkData {
        self.data.read().clone()
    }

    /// Copies the block grid into a caller-owned buffer.
    ///
    /// # Panics
    ///
    /// Panics if `out` is not exactly [`CHUNK_VOLUME`] long. A wrongly sized
    /// buffer is a caller bug, not a runtime condition.
    pub fn copy_blocks_into(&self, out: &mut [Block]) {
        assert_eq!(
            out.len(),
            CHUNK_VOLUME,
            "block buffer must hold exactly one chunk"
        );
        out.copy_from_slice(self.data.read().block_slice());
    }

    /// Returns a copy of the whole block grid.
    #[must_use]
    pub fn copy_all_blocks(&self) -> Vec<Block> {
        self.data.read().block_slice().to_vec()
    }

    /// Serializes the block grid (see module docs for the layout).
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.read().to_bytes()
    }

    /// Replaces the block grid from a serialized payload.
    ///
    /// On success the chunk needs remeshing but not saving.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::LengthMismatch`] if the payload length is not
    /// [`CHUNK_VOLUME`]; the chunk is left unmodified.
    pub fn load_bytes(&self, bytes: &[u8]) -> ChunkResult<()> {
        let mut data = self.data.write();
        data.load_bytes(bytes)?;
        self.version.fetch_add(1, Ordering::AcqRel);
        self.dirty.store(true, Ordering::Release);
        self.needs_save.store(false, Ordering::Release);
        Ok(())
    }

    /// Y of the highest non-air, non-floor voxel in a local column.
    #[must_use]
    pub fn top_solid_y(&self, x: i32, z: i32) -> Option<i32> {
        self.data.read().top_solid_y(x, z)
    }

    /// Counts voxels and reports flags.
    #[must_use]
    pub fn stats(&self) -> ChunkStats {
        let data = self.data.read();
        let (non_air_blocks, liquid_cells, air_blocks) = data.counts();
        ChunkStats {
            non_air_blocks,
            liquid_cells,
            air_blocks,
            version: self.version(),
            is_dirty: self.is_dirty(),
            needs_save: self.needs_save(),
        }
    }

    /// Records an effective mutation: sets both flags, stamps the time and
    /// bumps the version.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
        self.needs_save.store(true, Ordering::Release);
        self.last_modified.fetch_max(now_millis(), Ordering::AcqRel);
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Flags the chunk for remeshing without touching save state.
    ///
    /// Used when a neighbor changed a voxel on the shared face.
    pub fn mark_needs_remesh(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Clears the remesh flag once a consumer has picked up the change.
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::Release);
    }

    /// Clears the save flag after a successful flush.
    pub fn mark_saved(&self) {
        self.needs_save.store(false, Ordering::Release);
    }

    /// Serialized block grid together with the version it reflects.
    ///
    /// Both are read under one read lock, so the pair is consistent.
    #[must_use]
    pub fn save_snapshot(&self) -> (Vec<u8>, u64) {
        let data = self.data.read();
        (data.to_bytes(), self.version())
    }

    /// Clears the save flag only if nothing changed since `version` was
    /// taken by [`Self::save_snapshot`].
    ///
    /// Returns true if the flag was cleared. A write that raced the save
    /// keeps the chunk flagged for the next pass.
    pub fn mark_saved_if_unchanged(&self, version: u64) -> bool {
        let _data = self.data.write();
        if self.version() == version {
            self.mark_saved();
            true
        } else {
            false
        }
    }

    /// Has changes not yet picked up by a consumer.
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Must be flushed to storage.
    #[inline]
    #[must_use]
    pub fn needs_save(&self) -> bool {
        self.needs_save.load(Ordering::Acquire)
    }

    /// Mutation counter.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Milliseconds since the Unix epoch of the last mutation, 0 if never.
    #[inline]
    #[must_use]
    pub fn last_modified_ms(&self) -> u64 {
        self.last_modified.load(Ordering::Acquire)
    }
}

impl Clone for Chunk {
    fn clone(&self) -> Self {
        let data = self.data.read();
        Self {
            coord: self.coord,
            data: RwLock::new(data.clone()),
            dirty: AtomicBool::new(self.is_dirty()),
            needs_save: AtomicBool::new(self.needs_save()),
            version: AtomicU64::new(self.version()),
            last_modified: AtomicU64::new(self.last_modified_ms()),
        }
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("coord", &self.coord)
            .field("version", &self.version())
            .field("is_dirty", &self.is_dirty())
            .field("needs_save", &self.needs_save())
            .finish_non_exhaustive()
    }
}
