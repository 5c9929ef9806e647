//! # Chunk Persistence
//!
//! One file per chunk in a flat directory.
//!
//! ## Format
//!
//! - Name: `chunk_{cx}_{cy}_{cz}.bin`
//! - Contents: the block grid exactly as [`Chunk::to_bytes`] produces it,
//!   `CHUNK_VOLUME` bytes, no header, no compression
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a
//! crash mid-save leaves either the old file or the new one.
//!
//! Concurrent saves of the same chunk are not supported; callers run one
//! save pass at a time.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use loam_core::{Chunk, ChunkCoord, ChunkData};

use crate::error::{WorldError, WorldResult};

const PREFIX: &str = "chunk_";
const EXTENSION: &str = ".bin";

/// Chunk files under one directory.
#[derive(Clone, Debug)]
pub struct ChunkStore {
    dir: PathBuf,
}

impl ChunkStore {
    /// Creates a store over `dir`. Nothing is touched on disk until the
    /// first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the chunk files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a chunk.
    #[must_use]
    pub fn file_name(coord: ChunkCoord) -> String {
        format!("{PREFIX}{}_{}_{}{EXTENSION}", coord.x, coord.y, coord.z)
    }

    /// Parses a file name produced by [`Self::file_name`].
    #[must_use]
    pub fn parse_file_name(name: &str) -> Option<ChunkCoord> {
        let body = name.strip_prefix(PREFIX)?.strip_suffix(EXTENSION)?;
        let mut parts = body.split('_').map(str::parse::<i32>);
        let x = parts.next()?.ok()?;
        let y = parts.next()?.ok()?;
        let z = parts.next()?.ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(ChunkCoord::new(x, y, z))
    }

    /// Full path of a chunk's file.
    #[must_use]
    pub fn path_for(&self, coord: ChunkCoord) -> PathBuf {
        self.dir.join(Self::file_name(coord))
    }

    /// True if a file exists for the chunk.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.path_for(coord).is_file()
    }

    /// Reads a chunk's block grid.
    ///
    /// Returns `Ok(None)` if no file exists.
    ///
    /// # Errors
    ///
    /// - [`WorldError::Io`] if the file exists but cannot be read
    /// - [`WorldError::MalformedChunk`] if its length is wrong
    pub fn load(&self, coord: ChunkCoord) -> WorldResult<Option<ChunkData>> {
        let path = self.path_for(coord);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(WorldError::io(path, e)),
        };

        let mut data = ChunkData::new();
        data.load_bytes(&bytes)
            .map_err(|source| WorldError::MalformedChunk { coord, source })?;
        Ok(Some(data))
    }

    /// Writes a serialized block grid for a chunk.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Io`] if the directory, temp file or rename fails.
    pub fn save_bytes(&self, coord: ChunkCoord, bytes: &[u8]) -> WorldResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| WorldError::io(&self.dir, e))?;

        let path = self.path_for(coord);
        let tmp = path.with_extension("bin.tmp");

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()
        };
        if let Err(e) = write() {
            fs::remove_file(&tmp).ok();
            return Err(WorldError::io(tmp, e));
        }

        fs::rename(&tmp, &path).map_err(|e| WorldError::io(path, e))
    }

    /// Writes a chunk's current block grid. Flags are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Io`] on any file system failure.
    pub fn save(&self, chunk: &Chunk) -> WorldResult<()> {
        self.save_bytes(chunk.coord(), &chunk.to_bytes())
    }

    /// Deletes a chunk's file. Returns false if there was none.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Io`] if the file exists but cannot be removed.
    pub fn remove(&self, coord: ChunkCoord) -> WorldResult<bool> {
        let path = self.path_for(coord);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(WorldError::io(path, e)),
        }
    }

    /// Coordinates of every chunk file in the directory, sorted.
    ///
    /// A missing directory is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Io`] if the directory cannot be listed.
    pub fn saved_coords(&self) -> WorldResult<Vec<ChunkCoord>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(WorldError::io(&self.dir, e)),
        };

        let mut coords = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| WorldError::io(&self.dir, e))?;
            if let Some(coord) = entry.file_name().to_str().and_then(Self::parse_file_name) {
                coords.push(coord);
            }
        }
        coords.sort_unstable();
        Ok(coords)
    }
}
