//! # Terrain Generator
//!
//! Pure function from `(seed, chunk coordinate, max height)` to voxel data.
//!
//! ## Pipeline (per column)
//!
//! 1. Climate weights (desert, ocean) from [`BiomeClassifier`]
//! 2. Base surface: grassy and dune curves blended by desert weight, then
//!    pulled toward the ocean floor by ocean weight
//! 3. Pool depth (0-4) where the land sits well above sea level
//! 4. Carved surface and water top
//! 5. Per-voxel material by depth below the carved surface
//!
//! Cave carving runs after classification over the whole chunk, so carving
//! always wins. `y == 0` is bedrock no matter what.
//!
//! All noise is sampled in world coordinates: two chunks generated
//! independently agree on every column they could share.

use loam_core::{Block, Chunk, ChunkCoord, ChunkData, CHUNK_HEIGHT, CHUNK_SIZE, LIQUID_FULL};

use crate::biome::{Biome, BiomeClassifier};
use crate::noise::{lerp, NoiseKernel, WorldSeed};

const SIZE: i32 = CHUNK_SIZE as i32;
const HEIGHT: i32 = CHUNK_HEIGHT as i32;

/// Everything the generator decided about one world column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSample {
    /// Desert membership in `[0, 1]`.
    pub desert: f64,
    /// Ocean membership in `[0, 1]`.
    pub ocean: f64,
    /// Dominant biome.
    pub biome: Biome,
    /// Surface height before pools, in `[10, max_height]`.
    pub surface: i32,
    /// Depth of the pool carved into the surface (0 = none).
    pub pool_depth: i32,
    /// Height of the top solid voxel after pools and flooding.
    pub carved_surface: i32,
    /// Highest water voxel, if the column holds water.
    pub water_top: Option<i32>,
}

impl ColumnSample {
    /// Layers of sand or dirt under the top voxel, before the desert bonus.
    const FILLER_DEPTH: i32 = 3;
    /// Gravel layers under the filler in sandy columns.
    const GRAVEL_BAND: i32 = 2;

    /// True if the column holds any water above its surface.
    #[inline]
    #[must_use]
    pub const fn is_underwater(&self) -> bool {
        self.water_top.is_some()
    }

    /// Sandy columns get sand on top and a gravel band below.
    #[inline]
    #[must_use]
    pub fn is_sandy(&self) -> bool {
        self.desert > 0.5 || self.is_underwater()
    }

    /// Filler depth, widened from 3 to 5 by desert weight.
    #[inline]
    #[must_use]
    pub fn filler_depth(&self) -> i32 {
        Self::FILLER_DEPTH + (self.desert * 2.0).round() as i32
    }

    /// Material of the voxel at world height `wy`, before cave carving.
    #[must_use]
    pub fn block_at(&self, wy: i32) -> Block {
        if wy == 0 {
            return Block::BEDROCK;
        }
        if wy < 0 {
            return Block::AIR;
        }
        if wy > self.carved_surface {
            return match self.water_top {
                Some(top) if wy <= top => Block::WATER,
                _ => Block::AIR,
            };
        }

        let depth = self.carved_surface - wy;
        let sandy = self.is_sandy();
        let filler = self.filler_depth();

        if depth == 0 {
            if sandy {
                Block::SAND
            } else {
                Block::GRASS
            }
        } else if depth <= filler {
            if sandy {
                Block::SAND
            } else {
                Block::DIRT
            }
        } else if sandy && depth <= filler + Self::GRAVEL_BAND {
            Block::GRAVEL
        } else {
            Block::STONE
        }
    }

    /// Highest voxel this column fills with anything other than air.
    #[inline]
    #[must_use]
    pub fn top(&self) -> i32 {
        self.water_top
            .map_or(self.carved_surface, |t| t.max(self.carved_surface))
    }
}

/// Precomputed carved-surface heights over a world-space rectangle.
///
/// Cave carving reads depth below the surface from here. Columns outside
/// the rectangle have no height and are skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightMap {
    origin_x: i32,
    origin_z: i32,
    width: usize,
    depth: usize,
    heights: Vec<i32>,
}

impl HeightMap {
    /// Creates a map covering `width x depth` columns from the origin,
    /// every height zero.
    #[must_use]
    pub fn new(origin_x: i32, origin_z: i32, width: usize, depth: usize) -> Self {
        Self {
            origin_x,
            origin_z,
            width,
            depth,
            heights: vec![0; width * depth],
        }
    }

    /// World-space corner of the map.
    #[must_use]
    pub const fn origin(&self) -> (i32, i32) {
        (self.origin_x, self.origin_z)
    }

    /// Columns along X.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Columns along Z.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    fn index(&self, wx: i32, wz: i32) -> Option<usize> {
        let dx = usize::try_from(i64::from(wx) - i64::from(self.origin_x)).ok()?;
        let dz = usize::try_from(i64::from(wz) - i64::from(self.origin_z)).ok()?;
        (dx < self.width && dz < self.depth).then(|| dz * self.width + dx)
    }

    /// Height at a world column, `None` outside the map.
    #[inline]
    #[must_use]
    pub fn get(&self, wx: i32, wz: i32) -> Option<i32> {
        self.index(wx, wz).map(|i| self.heights[i])
    }

    /// Stores a height. Returns false (and stores nothing) outside the map.
    pub fn set(&mut self, wx: i32, wz: i32, height: i32) -> bool {
        match self.index(wx, wz) {
            Some(i) => {
                self.heights[i] = height;
                true
            }
            None => false,
        }
    }
}

/// Chunk generator using hashed value noise.
#[derive(Clone, Copy, Debug)]
pub struct TerrainGenerator {
    seed: WorldSeed,
    classifier: BiomeClassifier,
    /// Rolling grassland hills.
    hill_noise: NoiseKernel,
    /// Small surface bumps.
    detail_noise: NoiseKernel,
    /// Dune height.
    dune_noise: NoiseKernel,
    /// Ocean floor variation.
    floor_noise: NoiseKernel,
    /// Pool placement.
    pool_noise: NoiseKernel,
    /// Large cave shapes.
    cave_coarse: NoiseKernel,
    /// Cave wall detail.
    cave_fine: NoiseKernel,
    sea_level: i32,
    max_height: i32,
}

impl TerrainGenerator {
    /// Default sea level.
    pub const DEFAULT_SEA_LEVEL: i32 = 42;
    /// Lowest base surface.
    pub const MIN_SURFACE: i32 = 10;
    /// Lowest carved surface.
    pub const MIN_CARVED_SURFACE: i32 = 8;
    /// Deepest pool.
    pub const MAX_POOL_DEPTH: i32 = 4;
    /// Caves stay at least this far below the carved surface.
    pub const CAVE_MIN_DEPTH: i32 = 6;
    /// Caves never reach this height or below.
    pub const CAVE_FLOOR: i32 = 3;

    const COARSE_CAVE_WEIGHT: f64 = 0.74;
    const FINE_CAVE_WEIGHT: f64 = 0.26;
    const CAVE_THRESHOLD: f64 = 0.52;
    const CAVE_DEPTH_BONUS: f64 = 0.08;
    const CAVE_DEPTH_RAMP: i32 = 60;

    /// Creates a generator with default sea level and one chunk row of height.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        let kernel = NoiseKernel::new(seed);
        Self {
            seed,
            classifier: BiomeClassifier::new(seed),
            hill_noise: kernel.derive(10),
            detail_noise: kernel.derive(11),
            dune_noise: kernel.derive(12),
            floor_noise: kernel.derive(13),
            pool_noise: kernel.derive(14),
            cave_coarse: kernel.derive(15),
            cave_fine: kernel.derive(16),
            sea_level: Self::DEFAULT_SEA_LEVEL,
            max_height: HEIGHT,
        }
    }

    /// Sets the sea level.
    #[must_use]
    pub const fn with_sea_level(mut self, level: i32) -> Self {
        self.sea_level = level;
        self
    }

    /// Sets the maximum surface height.
    #[must_use]
    pub const fn with_max_height(mut self, max_height: i32) -> Self {
        self.max_height = max_height;
        self
    }

    /// World seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Sea level.
    #[must_use]
    pub const fn sea_level(&self) -> i32 {
        self.sea_level
    }

    /// Maximum surface height.
    #[must_use]
    pub const fn max_height(&self) -> i32 {
        self.max_height
    }

    /// Biome model used for climate weights.
    #[must_use]
    pub const fn classifier(&self) -> &BiomeClassifier {
        &self.classifier
    }

    /// Computes the column at world `(wx, wz)`.
    #[must_use]
    pub fn column(&self, wx: i32, wz: i32) -> ColumnSample {
        let fx = f64::from(wx);
        let fz = f64::from(wz);
        let climate = self.classifier.sample(fx, fz);
        let sea = f64::from(self.sea_level);
        let max = self.max_height.max(Self::MIN_SURFACE);

        let grassy = sea
            + 6.0
            + self.hill_noise.fractal_2d(fx / 96.0, fz / 96.0, 4, 2.0, 0.5) * 14.0
            + self.detail_noise.fractal_2d(fx / 32.0, fz / 32.0, 2, 2.0, 0.5) * 3.0;
        let dunes = sea + 4.0 + self.dune_noise.fractal_2d(fx / 128.0, fz / 128.0, 3, 2.0, 0.5) * 6.0;
        let land = lerp(grassy, dunes, climate.desert);
        let floor = sea - 12.0 + self.floor_noise.fractal_2d(fx / 200.0, fz / 200.0, 2, 2.0, 0.5) * 2.0;

        let surface = (lerp(land, floor, climate.ocean).round() as i32).clamp(Self::MIN_SURFACE, max);
        let pool_depth = self.pool_depth(fx, fz, surface, climate.desert);

        let mut carved_surface = (surface - pool_depth).clamp(Self::MIN_CARVED_SURFACE, max);
        let mut water_top = (pool_depth > 0).then_some(surface);
        let mut biome = climate.biome();

        if climate.ocean > 0.5 || carved_surface < self.sea_level {
            carved_surface = carved_surface.min(self.sea_level - 1).max(1);
            water_top = Some(water_top.map_or(self.sea_level, |t| t.max(self.sea_level)));
            if matches!(biome, Biome::Grassland | Biome::Desert) {
                biome = Biome::Shallows;
            }
        }

        ColumnSample {
            desert: climate.desert,
            ocean: climate.ocean,
            biome,
            surface,
            pool_depth,
            carved_surface,
            water_top,
        }
    }

    /// Pool depth for a column, 0 unless the surface is at least three
    /// voxels above sea level. Deserts need a stronger signal.
    fn pool_depth(&self, fx: f64, fz: f64, surface: i32, desert: f64) -> i32 {
        if surface < self.sea_level + 3 {
            return 0;
        }
        let signal = self.pool_noise.fractal_2d(fx / 24.0, fz / 24.0, 2, 2.0, 0.5);
        let threshold = 0.35 + 0.2 * desert;
        if signal <= threshold {
            return 0;
        }
        let strength = (signal - threshold) / (1.0 - threshold);
        ((strength * f64::from(Self::MAX_POOL_DEPTH)).ceil() as i32).clamp(1, Self::MAX_POOL_DEPTH)
    }

    /// Carved surfaces over a world rectangle.
    #[must_use]
    pub fn height_map(&self, origin_x: i32, origin_z: i32, width: usize, depth: usize) -> HeightMap {
        let mut map = HeightMap::new(origin_x, origin_z, width, depth);
        for dz in 0..depth as i32 {
            for dx in 0..width as i32 {
                let (wx, wz) = (origin_x + dx, origin_z + dz);
                map.set(wx, wz, self.column(wx, wz).carved_surface);
            }
        }
        map
    }

    /// Generates the voxel grids for a chunk.
    #[must_use]
    pub fn generate_data(&self, coord: ChunkCoord) -> ChunkData {
        let mut data = ChunkData::new();
        let (ox, oy, oz) = (coord.world_x(), coord.world_y(), coord.world_z());
        let mut surfaces = HeightMap::new(ox, oz, CHUNK_SIZE, CHUNK_SIZE);

        for lz in 0..SIZE {
            for lx in 0..SIZE {
                let column = self.column(ox + lx, oz + lz);
                surfaces.set(ox + lx, oz + lz, column.carved_surface);

                let top = (column.top() - oy + 1).clamp(0, HEIGHT);
                for ly in 0..top {
                    let block = column.block_at(oy + ly);
                    if block.is_air() {
                        continue;
                    }
                    data.set_block(lx, ly, lz, block);
                    if block.is_liquid() {
                        data.set_liquid(lx, ly, lz, LIQUID_FULL);
                    }
                }
            }
        }

        self.carve_caves(&mut data, coord, &surfaces);
        data
    }

    /// Generates a chunk. The result is clean; callers decide whether it
    /// needs saving.
    #[must_use]
    pub fn generate(&self, coord: ChunkCoord) -> Chunk {
        Chunk::from_data(coord, self.generate_data(coord))
    }

    /// Cave shape value at a voxel, roughly in `[-1, 1]`.
    #[must_use]
    pub fn cave_shape(&self, wx: i32, wy: i32, wz: i32) -> f64 {
        let (x, y, z) = (f64::from(wx), f64::from(wy), f64::from(wz));
        let coarse = self.cave_coarse.value_3d(x / 32.0, y / 20.0, z / 32.0);
        let fine = self.cave_fine.value_3d(x / 12.0, y / 10.0, z / 12.0);
        coarse * Self::COARSE_CAVE_WEIGHT + fine * Self::FINE_CAVE_WEIGHT
    }

    /// Carving threshold at a depth below the surface. Lower deeper down.
    #[must_use]
    pub fn cave_threshold(depth: i32) -> f64 {
        let ramp = f64::from(depth.clamp(0, Self::CAVE_DEPTH_RAMP)) / f64::from(Self::CAVE_DEPTH_RAMP);
        Self::CAVE_THRESHOLD - ramp * Self::CAVE_DEPTH_BONUS
    }

    /// Turns cave voxels into air.
    ///
    /// Only voxels that are neither air, water nor bedrock, at least
    /// [`Self::CAVE_MIN_DEPTH`] below the surface from `surfaces` and above
    /// [`Self::CAVE_FLOOR`] are candidates. Columns missing from `surfaces`
    /// are left alone.
    ///
    /// Returns the number of voxels carved.
    pub fn carve_caves(&self, data: &mut ChunkData, coord: ChunkCoord, surfaces: &HeightMap) -> usize {
        let (ox, oy, oz) = (coord.world_x(), coord.world_y(), coord.world_z());
        let mut carved = 0;

        for lz in 0..SIZE {
            for lx in 0..SIZE {
                let (wx, wz) = (ox + lx, oz + lz);
                let Some(surface) = surfaces.get(wx, wz) else {
                    continue;
                };

                let low = (Self::CAVE_FLOOR + 1 - oy).max(0);
                let high = (surface - Self::CAVE_MIN_DEPTH - oy).min(HEIGHT - 1);
                for ly in low..=high {
                    let block = data.block(lx, ly, lz);
                    if block.is_air() || block.is_liquid() || block.is_boundary() {
                        continue;
                    }
                    let wy = oy + ly;
                    if self.cave_shape(wx, wy, wz) > Self::cave_threshold(surface - wy) {
                        data.set_block(lx, ly, lz, Block::AIR);
                        carved += 1;
                    }
                }
            }
        }

        carved
    }
}

/// Generates one chunk from scratch.
///
/// Identical arguments always give byte-identical block grids.
#[must_use]
pub fn generate_chunk(seed: WorldSeed, coord: ChunkCoord, max_height: i32) -> Chunk {
    TerrainGenerator::new(seed)
        .with_max_height(max_height)
        .generate(coord)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_1337() -> TerrainGenerator {
        TerrainGenerator::new(WorldSeed::new(1337)).with_max_height(256)
    }

    #[test]
    fn test_chunk_generation_determinism() {
        let a = generate_chunk(WorldSeed::new(42), ChunkCoord::new(5, 0, 10), 256);
        let b = generate_chunk(WorldSeed::new(42), ChunkCoord::new(5, 0, 10), 256);
        assert_eq!(a.to_bytes(), b.to_bytes());
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_chunk(WorldSeed::new(1), ChunkCoord::new(0, 0, 0), 256);
        let b = generate_chunk(WorldSeed::new(2), ChunkCoord::new(0, 0, 0), 256);
        assert_ne!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_bedrock_floor() {
        let data = seed_1337().generate_data(ChunkCoord::new(0, 0, 0));
        for z in 0..SIZE {
            for x in 0..SIZE {
                assert_eq!(data.block(x, 0, z), Block::BEDROCK, "No bedrock at ({x}, 0, {z})");
            }
        }
    }

    #[test]
    fn test_surface_range() {
        let gen = seed_1337();
        for z in 0..SIZE {
            for x in 0..SIZE {
                let col = gen.column(x, z);
                assert!((10..=256).contains(&col.surface), "surface {} out of range", col.surface);
                assert!(col.carved_surface >= 1 && col.carved_surface <= 256);
                assert!((0..=TerrainGenerator::MAX_POOL_DEPTH).contains(&col.pool_depth));
            }
        }
    }

    #[test]
    fn test_surface_clamped_by_max_height() {
        let gen = TerrainGenerator::new(WorldSeed::new(9)).with_max_height(12);
        for x in (-200..200).step_by(7) {
            let col = gen.column(x, -x);
            assert!(col.surface <= 12);
            assert!(col.surface >= TerrainGenerator::MIN_SURFACE);
        }
    }

    #[test]
    fn test_column_materials() {
        let col = ColumnSample {
            desert: 0.0,
            ocean: 0.0,
            biome: Biome::Grassland,
            surface: 50,
            pool_depth: 0,
            carved_surface: 50,
            water_top: None,
        };
        assert_eq!(col.block_at(51), Block::AIR);
        assert_eq!(col.block_at(50), Block::GRASS);
        assert_eq!(col.block_at(47), Block::DIRT);
        assert_eq!(col.block_at(46), Block::STONE);
        assert_eq!(col.block_at(0), Block::BEDROCK);
        assert_eq!(col.block_at(-3), Block::AIR);

        let desert = ColumnSample { desert: 1.0, biome: Biome::Desert, ..col };
        assert_eq!(desert.filler_depth(), 5);
        assert_eq!(desert.block_at(50), Block::SAND);
        assert_eq!(desert.block_at(45), Block::SAND);
        assert_eq!(desert.block_at(44), Block::GRAVEL);
        assert_eq!(desert.block_at(43), Block::GRAVEL);
        assert_eq!(desert.block_at(42), Block::STONE);

        let pool = ColumnSample { pool_depth: 2, carved_surface: 48, water_top: Some(50), ..col };
        assert_eq!(pool.block_at(50), Block::WATER);
        assert_eq!(pool.block_at(49), Block::WATER);
        assert_eq!(pool.block_at(48), Block::SAND);
        assert_eq!(pool.block_at(51), Block::AIR);
        assert_eq!(pool.top(), 50);
    }

    #[test]
    fn test_water_has_liquid() {
        let gen = TerrainGenerator::new(WorldSeed::new(77));
        // Scan until a chunk with water shows up.
        let mut checked = false;
        'outer: for cx in -20..20 {
            let data = gen.generate_data(ChunkCoord::new(cx, 0, cx * 3));
            for y in 0..HEIGHT {
                for z in 0..SIZE {
                    for x in 0..SIZE {
                        if data.block(x, y, z).is_liquid() {
                            assert_eq!(data.liquid(x, y, z), LIQUID_FULL);
                            checked = true;
                            break 'outer;
                        }
                    }
                }
            }
        }
        assert!(checked, "expected some water within 40 chunks");
    }

    #[test]
    fn test_underwater_columns_below_sea() {
        let gen = TerrainGenerator::new(WorldSeed::new(3));
        for x in (-3000..3000).step_by(61) {
            let col = gen.column(x, x / 2);
            if col.ocean > 0.5 {
                assert!(col.carved_surface < gen.sea_level());
                assert_eq!(col.water_top, Some(gen.sea_level()));
            }
            if col.water_top.is_none() {
                assert!(col.carved_surface >= gen.sea_level());
            }
        }
    }

    #[test]
    fn test_caves_respect_depth() {
        let gen = seed_1337();
        for cz in -2..2 {
            for cx in -2..2 {
                let coord = ChunkCoord::new(cx, 0, cz);
                let data = gen.generate_data(coord);
                for z in 0..SIZE {
                    for x in 0..SIZE {
                        let col = gen.column(coord.world_x() + x, coord.world_z() + z);
                        let limit = col.carved_surface - TerrainGenerator::CAVE_MIN_DEPTH;
                        for y in 1..=col.carved_surface.min(HEIGHT - 1) {
                            let expected = col.block_at(y);
                            let actual = data.block(x, y, z);
                            if actual != expected {
                                assert!(actual.is_air(), "only air may replace terrain");
                                assert!(y > TerrainGenerator::CAVE_FLOOR && y <= limit);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_carve_caves_skips_missing_columns() {
        let gen = seed_1337();
        let coord = ChunkCoord::new(0, 0, 0);
        let mut data = ChunkData::new();
        for y in 1..100 {
            for z in 0..SIZE {
                for x in 0..SIZE {
                    data.set_block(x, y, z, Block::STONE);
                }
            }
        }
        let before = data.clone();

        let elsewhere = HeightMap::new(1000, 1000, 16, 16);
        assert_eq!(gen.carve_caves(&mut data, coord, &elsewhere), 0);
        assert_eq!(data, before);

        // Only the first column is covered.
        let mut one = HeightMap::new(0, 0, 1, 1);
        one.set(0, 0, 99);
        gen.carve_caves(&mut data, coord, &one);
        for y in 0..HEIGHT {
            for z in 0..SIZE {
                for x in 0..SIZE {
                    if x != 0 || z != 0 {
                        assert_eq!(data.block(x, y, z), before.block(x, y, z));
                    }
                }
            }
        }
    }

    #[test]
    fn test_height_map_bounds() {
        let mut map = HeightMap::new(-8, 4, 4, 2);
        assert!(map.set(-8, 4, 30));
        assert!(map.set(-5, 5, 31));
        assert!(!map.set(-4, 5, 1));
        assert!(!map.set(-9, 4, 1));
        assert!(!map.set(-8, 6, 1));
        assert_eq!(map.get(-8, 4), Some(30));
        assert_eq!(map.get(-5, 5), Some(31));
        assert_eq!(map.get(-4, 4), None);
        assert_eq!(map.origin(), (-8, 4));
    }

    #[test]
    fn test_height_map_matches_columns() {
        let gen = seed_1337();
        let map = gen.height_map(-20, 7, 5, 3);
        assert_eq!(map.get(-18, 8), Some(gen.column(-18, 8).carved_surface));
    }

    #[test]
    fn test_cave_threshold_decreases_with_depth() {
        let shallow = TerrainGenerator::cave_threshold(6);
        let deep = TerrainGenerator::cave_threshold(60);
        assert!(deep < shallow);
        assert_eq!(TerrainGenerator::cave_threshold(200), deep);
        assert!((TerrainGenerator::cave_threshold(0) - 0.52).abs() < 1e-12);
    }

    #[test]
    fn test_upper_row_is_empty() {
        let data = seed_1337().generate_data(ChunkCoord::new(0, 1, 0));
        assert_eq!(data.counts().0, 0);
    }

    #[test]
    fn test_chunk_has_terrain() {
        let chunk = seed_1337().generate(ChunkCoord::new(0, 0, 0));
        let stats = chunk.stats();
        assert!(stats.non_air_blocks > CHUNK_SIZE * CHUNK_SIZE * 8);
        assert!(!stats.is_dirty);
        assert_eq!(stats.version, 0);
    }
}
