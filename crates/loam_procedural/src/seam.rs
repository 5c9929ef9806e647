//! # Seam Profile Cache
//!
//! Per-chunk surface heights and their four lateral edges, kept so that
//! independently generated neighbors can agree on the heights along their
//! shared border.
//!
//! ## Edges
//!
//! | Edge  | Row of the height grid | Indexed by |
//! |-------|------------------------|------------|
//! | north | `z == 0`               | x          |
//! | south | `z == 15`              | x          |
//! | west  | `x == 0`               | z          |
//! | east  | `x == 15`              | z          |
//!
//! Blending averages each matching pair of edge entries and writes the
//! result into both profiles. The height grid itself is left as scanned.
//!
//! The cache belongs to one world and is cleared when that world closes.

use std::collections::HashMap;

use parking_lot::RwLock;

use loam_core::{Chunk, ChunkCoord, ChunkData, Face, CHUNK_SIZE};

const SIZE: i32 = CHUNK_SIZE as i32;

/// Faces that have a profile edge.
pub const LATERAL_FACES: [Face; 4] = [Face::North, Face::South, Face::East, Face::West];

/// One edge of a profile, one height per column along the border.
pub type EdgeHeights = [i32; CHUNK_SIZE];

/// Surface heights of one chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceProfile {
    coord: ChunkCoord,
    /// World-space heights, `[z][x]`.
    heights: [[i32; CHUNK_SIZE]; CHUNK_SIZE],
    north: EdgeHeights,
    south: EdgeHeights,
    east: EdgeHeights,
    west: EdgeHeights,
}

impl SurfaceProfile {
    /// Scans each column top-down for the first voxel that is neither air
    /// nor bedrock. Empty columns get the height just below the chunk.
    #[must_use]
    pub fn from_data(coord: ChunkCoord, data: &ChunkData) -> Self {
        let base = coord.world_y();
        let mut heights = [[base - 1; CHUNK_SIZE]; CHUNK_SIZE];
        for (z, row) in heights.iter_mut().enumerate() {
            for (x, height) in row.iter_mut().enumerate() {
                if let Some(y) = data.top_solid_y(x as i32, z as i32) {
                    *height = base + y;
                }
            }
        }
        Self::from_heights(coord, heights)
    }

    /// Scans one column of a chunk under its read lock, the same way
    /// [`Self::from_data`] does.
    #[must_use]
    pub fn scan_column(chunk: &Chunk, x: i32, z: i32) -> i32 {
        let base = chunk.coord().world_y();
        chunk.top_solid_y(x, z).map_or(base - 1, |y| base + y)
    }

    /// Builds a profile from a resident chunk under its read lock.
    #[must_use]
    pub fn from_chunk(chunk: &Chunk) -> Self {
        let data = chunk.read();
        Self::from_data(chunk.coord(), &data)
    }

    /// Builds a profile from a height grid and extracts its edges.
    #[must_use]
    pub fn from_heights(coord: ChunkCoord, heights: [[i32; CHUNK_SIZE]; CHUNK_SIZE]) -> Self {
        let mut profile = Self {
            coord,
            heights,
            north: [0; CHUNK_SIZE],
            south: [0; CHUNK_SIZE],
            east: [0; CHUNK_SIZE],
            west: [0; CHUNK_SIZE],
        };
        profile.extract_edges();
        profile
    }

    /// Copies the border rows of the height grid into the edge arrays.
    pub fn extract_edges(&mut self) {
        let last = CHUNK_SIZE - 1;
        for i in 0..CHUNK_SIZE {
            self.north[i] = self.heights[0][i];
            self.south[i] = self.heights[last][i];
            self.west[i] = self.heights[i][0];
            self.east[i] = self.heights[i][last];
        }
    }

    /// Replaces one column's height after an edit.
    ///
    /// Only the edge entries that column lies on are overwritten; interior
    /// columns leave every edge, blended or not, as it was. Returns false
    /// if the column is out of range.
    pub fn set_column(&mut self, x: i32, z: i32, height: i32) -> bool {
        if !(0..SIZE).contains(&x) || !(0..SIZE).contains(&z) {
            return false;
        }
        let (xi, zi) = (x as usize, z as usize);
        self.heights[zi][xi] = height;
        let last = SIZE - 1;
        if z == 0 {
            self.north[xi] = height;
        }
        if z == last {
            self.south[xi] = height;
        }
        if x == 0 {
            self.west[zi] = height;
        }
        if x == last {
            self.east[zi] = height;
        }
        true
    }

    /// Owning chunk.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Scanned height of a local column, `None` out of range.
    #[must_use]
    pub fn height(&self, x: i32, z: i32) -> Option<i32> {
        if (0..SIZE).contains(&x) && (0..SIZE).contains(&z) {
            Some(self.heights[z as usize][x as usize])
        } else {
            None
        }
    }

    /// Edge heights on a lateral face, `None` for up and down.
    #[must_use]
    pub const fn edge(&self, face: Face) -> Option<&EdgeHeights> {
        match face {
            Face::North => Some(&self.north),
            Face::South => Some(&self.south),
            Face::East => Some(&self.east),
            Face::West => Some(&self.west),
            Face::Up | Face::Down => None,
        }
    }

    fn edge_mut(&mut self, face: Face) -> Option<&mut EdgeHeights> {
        match face {
            Face::North => Some(&mut self.north),
            Face::South => Some(&mut self.south),
            Face::East => Some(&mut self.east),
            Face::West => Some(&mut self.west),
            Face::Up | Face::Down => None,
        }
    }

    /// Averages this profile's `face` edge with the neighbor's opposite
    /// edge and stores the result in both.
    ///
    /// Returns false for up and down, which have no edge.
    pub fn blend_edge(&mut self, face: Face, neighbor: &mut Self) -> bool {
        let (Some(mine), Some(theirs)) = (self.edge_mut(face), neighbor.edge_mut(face.opposite()))
        else {
            return false;
        };
        for (a, b) in mine.iter_mut().zip(theirs.iter_mut()) {
            let avg = (*a + *b).div_euclid(2);
            *a = avg;
            *b = avg;
        }
        true
    }
}

/// Concurrent registry of surface profiles, keyed by chunk coordinate.
#[derive(Debug, Default)]
pub struct SeamCache {
    profiles: RwLock<HashMap<ChunkCoord, SurfaceProfile>>,
}

impl SeamCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a profile, replacing any previous one for the same chunk.
    pub fn register(&self, profile: SurfaceProfile) {
        self.profiles.write().insert(profile.coord(), profile);
    }

    /// Rescans a chunk and replaces its profile.
    ///
    /// The chunk's read lock is released before the registry lock is taken.
    pub fn rebuild(&self, chunk: &Chunk) {
        let profile = SurfaceProfile::from_chunk(chunk);
        self.register(profile);
    }

    /// Patches one column of a registered profile in place.
    ///
    /// Returns false if the chunk has no profile or the column is out of
    /// range.
    pub fn update_column(&self, coord: ChunkCoord, x: i32, z: i32, height: i32) -> bool {
        self.profiles
            .write()
            .get_mut(&coord)
            .is_some_and(|profile| profile.set_column(x, z, height))
    }

    /// Copy of a chunk's profile.
    #[must_use]
    pub fn get(&self, coord: ChunkCoord) -> Option<SurfaceProfile> {
        self.profiles.read().get(&coord).cloned()
    }

    /// True if the chunk has a profile.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.profiles.read().contains_key(&coord)
    }

    /// Drops a chunk's profile. Returns true if one was present.
    pub fn remove(&self, coord: ChunkCoord) -> bool {
        self.profiles.write().remove(&coord).is_some()
    }

    /// Number of registered profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    /// True if no profile is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }

    /// Drops every profile.
    pub fn clear(&self) {
        self.profiles.write().clear();
    }

    /// Blends a chunk's edges with each lateral neighbor that has a profile.
    ///
    /// Both sides of every shared border end up with identical edge arrays.
    /// Returns the number of neighbors blended (0 if `coord` itself has no
    /// profile).
    pub fn blend_with_neighbors(&self, coord: ChunkCoord) -> usize {
        let mut profiles = self.profiles.write();
        let Some(mut center) = profiles.remove(&coord) else {
            return 0;
        };

        let mut blended = 0;
        for face in LATERAL_FACES {
            if let Some(neighbor) = profiles.get_mut(&coord.neighbor(face)) {
                if center.blend_edge(face, neighbor) {
                    blended += 1;
                }
            }
        }

        profiles.insert(coord, center);
        blended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::Block;

    fn flat(coord: ChunkCoord, height: i32) -> SurfaceProfile {
        SurfaceProfile::from_heights(coord, [[height; CHUNK_SIZE]; CHUNK_SIZE])
    }

    #[test]
    fn test_scan_skips_bedrock() {
        let mut data = ChunkData::new();
        data.set_block(3, 0, 4, Block::BEDROCK);
        data.set_block(5, 40, 6, Block::STONE);
        data.set_block(5, 41, 6, Block::WATER);
        let profile = SurfaceProfile::from_data(ChunkCoord::new(0, 0, 0), &data);
        assert_eq!(profile.height(3, 4), Some(-1));
        assert_eq!(profile.height(5, 6), Some(41));
        assert_eq!(profile.height(16, 0), None);
    }

    #[test]
    fn test_heights_are_world_space() {
        let mut data = ChunkData::new();
        data.set_block(0, 10, 0, Block::DIRT);
        let profile = SurfaceProfile::from_data(ChunkCoord::new(0, 1, 0), &data);
        assert_eq!(profile.height(0, 0), Some(266));
    }

    #[test]
    fn test_edge_extraction() {
        let mut heights = [[0; CHUNK_SIZE]; CHUNK_SIZE];
        for (z, row) in heights.iter_mut().enumerate() {
            for (x, h) in row.iter_mut().enumerate() {
                *h = (z * 100 + x) as i32;
            }
        }
        let p = SurfaceProfile::from_heights(ChunkCoord::new(0, 0, 0), heights);
        assert_eq!(p.edge(Face::North).map(|e| e[3]), Some(3));
        assert_eq!(p.edge(Face::South).map(|e| e[3]), Some(1503));
        assert_eq!(p.edge(Face::West).map(|e| e[3]), Some(300));
        assert_eq!(p.edge(Face::East).map(|e| e[3]), Some(315));
        assert!(p.edge(Face::Up).is_none());
    }

    #[test]
    fn test_blend_makes_edges_equal() {
        let cache = SeamCache::new();
        let center = ChunkCoord::new(0, 0, 0);
        cache.register(flat(center, 50));
        cache.register(flat(ChunkCoord::new(1, 0, 0), 61));
        cache.register(flat(ChunkCoord::new(0, 0, -1), 40));

        assert_eq!(cache.blend_with_neighbors(center), 2);

        let c = cache.get(center).unwrap();
        let east = cache.get(ChunkCoord::new(1, 0, 0)).unwrap();
        let north = cache.get(ChunkCoord::new(0, 0, -1)).unwrap();
        assert_eq!(c.edge(Face::East), east.edge(Face::West));
        assert_eq!(c.edge(Face::North), north.edge(Face::South));
        assert_eq!(c.edge(Face::East).unwrap()[0], 55);
        assert_eq!(c.edge(Face::North).unwrap()[0], 45);
        // Untouched edges and the grid keep their scanned values.
        assert_eq!(c.edge(Face::South).unwrap()[0], 50);
        assert_eq!(c.height(15, 5), Some(50));
    }

    #[test]
    fn test_blend_negative_heights_floor() {
        let mut a = flat(ChunkCoord::new(0, -1, 0), -3);
        let mut b = flat(ChunkCoord::new(-1, -1, 0), -6);
        assert!(a.blend_edge(Face::West, &mut b));
        assert_eq!(a.edge(Face::West).unwrap()[7], -5);
        assert_eq!(b.edge(Face::East).unwrap()[7], -5);
        assert!(!a.blend_edge(Face::Down, &mut b));
    }

    #[test]
    fn test_blend_without_profile() {
        let cache = SeamCache::new();
        cache.register(flat(ChunkCoord::new(1, 0, 0), 10));
        assert_eq!(cache.blend_with_neighbors(ChunkCoord::new(0, 0, 0)), 0);
        assert!(!cache.contains(ChunkCoord::new(0, 0, 0)));
    }

    #[test]
    fn test_register_remove() {
        let cache = SeamCache::new();
        assert!(cache.is_empty());
        cache.register(flat(ChunkCoord::new(2, 0, 2), 1));
        assert_eq!(cache.len(), 1);
        assert!(cache.remove(ChunkCoord::new(2, 0, 2)));
        assert!(!cache.remove(ChunkCoord::new(2, 0, 2)));
        cache.register(flat(ChunkCoord::new(2, 0, 2), 1));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_column_keeps_blended_edges() {
        let mut a = flat(ChunkCoord::new(0, 0, 0), 50);
        let mut b = flat(ChunkCoord::new(1, 0, 0), 60);
        assert!(a.blend_edge(Face::East, &mut b));

        // Interior edit: the blended east edge survives.
        assert!(a.set_column(7, 7, 90));
        assert_eq!(a.height(7, 7), Some(90));
        assert_eq!(a.edge(Face::East).unwrap()[7], 55);

        // Edit on the east border: only that entry changes.
        assert!(a.set_column(15, 3, 70));
        assert_eq!(a.edge(Face::East).unwrap()[3], 70);
        assert_eq!(a.edge(Face::East).unwrap()[4], 55);
        assert_eq!(a.edge(Face::North).unwrap()[15], 50);

        // Corner edits touch both edges.
        assert!(a.set_column(0, 0, 12));
        assert_eq!(a.edge(Face::North).unwrap()[0], 12);
        assert_eq!(a.edge(Face::West).unwrap()[0], 12);

        assert!(!a.set_column(16, 0, 1));
        assert!(!a.set_column(0, -1, 1));
    }

    #[test]
    fn test_update_column_from_chunk() {
        let cache = SeamCache::new();
        let chunk = Chunk::new(ChunkCoord::new(0, 0, 0));
        assert!(!cache.update_column(chunk.coord(), 2, 2, 10));

        cache.rebuild(&chunk);
        chunk.set_block(2, 40, 2, Block::STONE);
        chunk.set_block(3, 41, 3, Block::STONE);
        let height = SurfaceProfile::scan_column(&chunk, 2, 2);
        assert_eq!(height, 40);
        assert!(cache.update_column(chunk.coord(), 2, 2, height));

        let profile = cache.get(chunk.coord()).unwrap();
        assert_eq!(profile.height(2, 2), Some(40));
        // Columns not named are not rescanned.
        assert_eq!(profile.height(3, 3), Some(-1));
        assert_eq!(SurfaceProfile::scan_column(&chunk, 9, 9), -1);
    }

    #[test]
    fn test_rebuild_from_chunk() {
        let cache = SeamCache::new();
        let chunk = Chunk::new(ChunkCoord::new(0, 0, 0));
        cache.rebuild(&chunk);
        assert_eq!(cache.get(chunk.coord()).unwrap().height(0, 0), Some(-1));

        chunk.set_block(0, 77, 0, Block::STONE);
        cache.rebuild(&chunk);
        assert_eq!(cache.get(chunk.coord()).unwrap().height(0, 0), Some(77));
    }
}
