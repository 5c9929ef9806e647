//! # LOAM Procedural Generation
//!
//! Deterministic terrain for a persistent voxel world, plus the world that
//! streams, edits and saves it.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same world, bit for bit
//! 2. **Chunked**: World is generated, saved and evicted in fixed-size chunks
//! 3. **Seamless**: Noise is sampled in world space and chunk edges are blended
//! 4. **Fail-soft persistence**: Bad files regenerate, failed saves retry later
//!
//! ## Core Components
//!
//! - `NoiseKernel`: Seeded hash/value/fractal noise
//! - `BiomeClassifier`: Desert and ocean band weights from climate noise
//! - `TerrainGenerator`: Surfaces, pools, materials and caves
//! - `SeamCache`: Per-chunk surface profiles with edge blending
//! - `ChunkStore`: One file per chunk
//! - `World`: Resident chunk map, edits, save passes, unloading
//!
//! ## Example
//!
//! ```rust,ignore
//! use loam_procedural::{World, WorldConfig, WorldSeed};
//! use loam_core::Block;
//!
//! let world = World::open(WorldConfig::new(WorldSeed::new(1337), "saves/chunks"));
//!
//! world.set_block(-3, 90, 17, Block::STONE);
//! assert_eq!(world.get_block(-3, 90, 17), Block::STONE);
//!
//! world.save_modified_chunks();
//! world.close();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod chunk_persistence;
pub mod config;
pub mod error;
pub mod generator;
pub mod noise;
pub mod seam;
pub mod world_manager;

pub use biome::{band_weight, Biome, BiomeClassifier, ClimateSample};
pub use chunk_persistence::ChunkStore;
pub use config::{WorldConfig, WorldMetadata, WorldSize};
pub use error::{WorldError, WorldResult};
pub use generator::{generate_chunk, ColumnSample, HeightMap, TerrainGenerator};
pub use noise::{
    fractal_value_noise_2d, hash_noise_2d, hash_noise_3d, value_noise_2d, value_noise_3d,
    NoiseKernel, WorldSeed,
};
pub use seam::{SeamCache, SurfaceProfile};
pub use world_manager::{World, WorldStats};
