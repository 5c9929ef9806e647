//! # Coordinate System
//!
//! Pure mappings between three spaces:
//!
//! - **World space**: integer voxel positions, unbounded in every direction
//! - **Chunk space**: which chunk a voxel belongs to
//! - **Local space**: the voxel's offset inside its chunk
//!
//! All conversions use floor division and floor modulo, so `-1` lives in
//! chunk `-1` at local offset `size - 1`, never in chunk `0`.

/// Chunk width and depth in voxels (X and Z).
pub const CHUNK_SIZE: usize = 16;

/// Chunk height in voxels (Y).
pub const CHUNK_HEIGHT: usize = 256;

/// Total voxels per chunk.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_HEIGHT * CHUNK_SIZE;

const SIZE_I: i32 = CHUNK_SIZE as i32;
const HEIGHT_I: i32 = CHUNK_HEIGHT as i32;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not voxels).
    pub x: i32,
    /// Y coordinate (in chunk rows).
    pub y: i32,
    /// Z coordinate (in chunks, not voxels).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Converts world voxel coordinates to the owning chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn from_world_pos(wx: i32, wy: i32, wz: i32) -> Self {
        Self {
            x: wx.div_euclid(SIZE_I),
            y: wy.div_euclid(HEIGHT_I),
            z: wz.div_euclid(SIZE_I),
        }
    }

    /// Returns the world X coordinate of the chunk's origin (corner).
    #[inline]
    #[must_use]
    pub const fn world_x(self) -> i32 {
        self.x * SIZE_I
    }

    /// Returns the world Y coordinate of the chunk's origin.
    #[inline]
    #[must_use]
    pub const fn world_y(self) -> i32 {
        self.y * HEIGHT_I
    }

    /// Returns the world Z coordinate of the chunk's origin.
    #[inline]
    #[must_use]
    pub const fn world_z(self) -> i32 {
        self.z * SIZE_I
    }

    /// Returns the coordinate shifted by a chunk-space delta.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Returns the neighbor across the given face.
    #[inline]
    #[must_use]
    pub const fn neighbor(self, face: Face) -> Self {
        let (dx, dy, dz) = face.delta();
        self.offset(dx, dy, dz)
    }

    /// Returns the four lateral (same row) neighbors in
    /// north, south, east, west order.
    #[must_use]
    pub const fn lateral_neighbors(self) -> [Self; 4] {
        [
            self.neighbor(Face::North),
            self.neighbor(Face::South),
            self.neighbor(Face::East),
            self.neighbor(Face::West),
        ]
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<ChunkCoord> for (i32, i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.x, value.y, value.z)
    }
}

/// Position of a voxel inside its chunk.
///
/// Produced by [`world_to_chunk`], every component lies in `[0, size)` for
/// its axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LocalPos {
    /// Local X (0-15).
    pub x: i32,
    /// Local Y (0-255).
    pub y: i32,
    /// Local Z (0-15).
    pub z: i32,
}

impl LocalPos {
    /// Creates a new local position. No range check is performed.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Converts world voxel coordinates to the offset within their chunk.
    #[inline]
    #[must_use]
    pub const fn from_world_pos(wx: i32, wy: i32, wz: i32) -> Self {
        Self {
            x: wx.rem_euclid(SIZE_I),
            y: wy.rem_euclid(HEIGHT_I),
            z: wz.rem_euclid(SIZE_I),
        }
    }

    /// Returns true if every component is inside chunk bounds.
    #[inline]
    #[must_use]
    pub const fn in_bounds(self) -> bool {
        self.x >= 0
            && self.x < SIZE_I
            && self.y >= 0
            && self.y < HEIGHT_I
            && self.z >= 0
            && self.z < SIZE_I
    }

    /// Returns the chunk faces this position touches.
    ///
    /// A voxel on an edge touches two faces, a corner touches three.
    #[must_use]
    pub fn touched_faces(self) -> impl Iterator<Item = Face> {
        let checks = [
            (self.z == 0, Face::North),
            (self.z == SIZE_I - 1, Face::South),
            (self.x == SIZE_I - 1, Face::East),
            (self.x == 0, Face::West),
            (self.y == HEIGHT_I - 1, Face::Up),
            (self.y == 0, Face::Down),
        ];
        checks
            .into_iter()
            .filter_map(|(touches, face)| touches.then_some(face))
    }
}

/// One of the six faces of a chunk.
///
/// North is `-Z`, south is `+Z`, east is `+X`, west is `-X`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    /// -Z
    North,
    /// +Z
    South,
    /// +X
    East,
    /// -X
    West,
    /// +Y
    Up,
    /// -Y
    Down,
}

impl Face {
    /// All six faces.
    pub const ALL: [Self; 6] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::Up,
        Self::Down,
    ];

    /// Chunk-space step across this face.
    #[inline]
    #[must_use]
    pub const fn delta(self) -> (i32, i32, i32) {
        match self {
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::East => (1, 0, 0),
            Self::West => (-1, 0, 0),
            Self::Up => (0, 1, 0),
            Self::Down => (0, -1, 0),
        }
    }

    /// The face on the other side of the shared boundary.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// Splits a world voxel position into its chunk and local offset.
#[inline]
#[must_use]
pub const fn world_to_chunk(wx: i32, wy: i32, wz: i32) -> (ChunkCoord, LocalPos) {
    (
        ChunkCoord::from_world_pos(wx, wy, wz),
        LocalPos::from_world_pos(wx, wy, wz),
    )
}

/// Recombines a chunk coordinate and local offset into a world position.
#[inline]
#[must_use]
pub const fn chunk_to_world(coord: ChunkCoord, local: LocalPos) -> (i32, i32, i32) {
    (
        coord.world_x() + local.x,
        coord.world_y() + local.y,
        coord.world_z() + local.z,
    )
}
