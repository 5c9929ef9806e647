//! # World Configuration
//!
//! Two layers:
//!
//! - [`WorldMetadata`]: the persisted document (`seed` plus `size`), parsed
//!   from TOML. Only repaired here, never validated beyond that.
//! - [`WorldConfig`]: what the generator and the world actually run with.
//!
//! ```toml
//! seed = 1337
//!
//! [size]
//! width = 512
//! depth = 512
//! height = 256
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use loam_core::CHUNK_HEIGHT;

use crate::error::{WorldError, WorldResult};
use crate::generator::TerrainGenerator;
use crate::noise::WorldSeed;

const HEIGHT: i32 = CHUNK_HEIGHT as i32;

/// World extent in voxels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSize {
    /// Extent along X.
    pub width: i32,
    /// Extent along Z.
    pub depth: i32,
    /// Extent along Y.
    pub height: i32,
}

impl WorldSize {
    /// Width used when the stored one is not positive.
    pub const DEFAULT_WIDTH: i32 = 512;
    /// Depth used when the stored one is not positive.
    pub const DEFAULT_DEPTH: i32 = 512;
    /// Height used when the stored one is not positive.
    pub const DEFAULT_HEIGHT: i32 = 256;

    /// Replaces zero or negative fields with the defaults.
    #[must_use]
    pub const fn repaired(self) -> Self {
        Self {
            width: if self.width > 0 { self.width } else { Self::DEFAULT_WIDTH },
            depth: if self.depth > 0 { self.depth } else { Self::DEFAULT_DEPTH },
            height: if self.height > 0 { self.height } else { Self::DEFAULT_HEIGHT },
        }
    }
}

impl Default for WorldSize {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            depth: Self::DEFAULT_DEPTH,
            height: Self::DEFAULT_HEIGHT,
        }
    }
}

/// The persisted world metadata document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldMetadata {
    /// Generation seed.
    pub seed: i64,
    /// World extent.
    #[serde(default)]
    pub size: WorldSize,
}

impl WorldMetadata {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Config`] if the document is not valid.
    pub fn from_toml_str(text: &str) -> WorldResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Io`] if the file cannot be read and
    /// [`WorldError::Config`] if it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> WorldResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| WorldError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Same document with its size repaired.
    #[must_use]
    pub const fn repaired(self) -> Self {
        Self {
            seed: self.seed,
            size: self.size.repaired(),
        }
    }
}

/// Settings a world runs with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    /// Generation seed.
    pub seed: WorldSeed,
    /// Maximum world height in voxels, a whole number of chunk rows.
    pub max_height: i32,
    /// Sea level used by the generator.
    pub sea_level: i32,
    /// Directory holding one file per saved chunk.
    pub chunk_dir: PathBuf,
    /// Save attempts per `save_modified_chunks` call.
    pub save_budget: usize,
}

impl WorldConfig {
    /// Default per-call save budget.
    pub const DEFAULT_SAVE_BUDGET: usize = 8;

    /// Creates a config with default height, sea level and budget.
    #[must_use]
    pub fn new(seed: WorldSeed, chunk_dir: impl Into<PathBuf>) -> Self {
        Self {
            seed,
            max_height: HEIGHT,
            sea_level: TerrainGenerator::DEFAULT_SEA_LEVEL,
            chunk_dir: chunk_dir.into(),
            save_budget: Self::DEFAULT_SAVE_BUDGET,
        }
    }

    /// Builds a config from a metadata document, repairing its size first.
    #[must_use]
    pub fn from_metadata(metadata: WorldMetadata, chunk_dir: impl Into<PathBuf>) -> Self {
        let metadata = metadata.repaired();
        Self::new(WorldSeed::from_signed(metadata.seed), chunk_dir)
            .with_max_height(metadata.size.height)
    }

    /// Sets the maximum height, rounded down to whole chunk rows (at least one).
    #[must_use]
    pub fn with_max_height(mut self, max_height: i32) -> Self {
        self.max_height = round_to_rows(max_height);
        self
    }

    /// Sets the sea level.
    #[must_use]
    pub const fn with_sea_level(mut self, sea_level: i32) -> Self {
        self.sea_level = sea_level;
        self
    }

    /// Sets the per-call save budget.
    #[must_use]
    pub const fn with_save_budget(mut self, budget: usize) -> Self {
        self.save_budget = budget;
        self
    }

    /// Number of chunk rows the world holds.
    #[must_use]
    pub const fn chunk_rows(&self) -> i32 {
        self.max_height / HEIGHT
    }

    /// Generator matching this config.
    #[must_use]
    pub fn generator(&self) -> TerrainGenerator {
        TerrainGenerator::new(self.seed)
            .with_sea_level(self.sea_level)
            .with_max_height(self.max_height)
    }
}

fn round_to_rows(max_height: i32) -> i32 {
    (max_height.div_euclid(HEIGHT)).max(1) * HEIGHT
}
