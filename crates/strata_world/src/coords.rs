//! # Coordinate Mapping
//!
//! World block positions split into a chunk coordinate and a position
//! local to that chunk. Both halves use floor division, so for every axis
//! `world == chunk * extent + local` with `0 <= local < extent`, negative
//! coordinates included:
//!
//! ```rust
//! use strata_world::{ChunkCoord, LocalPos, WorldPos};
//!
//! let pos = WorldPos::new(-1, 300, -17);
//! assert_eq!(pos.chunk(), ChunkCoord::new(-1, 1, -2));
//! assert_eq!(pos.local(), LocalPos::new(15, 44, 15));
//! assert_eq!(WorldPos::from_parts(pos.chunk(), pos.local()), pos);
//! ```

use std::fmt;

/// Chunk width along X, in blocks.
pub const CHUNK_SIZE_X: usize = 16;

/// Chunk height along Y, in blocks.
pub const CHUNK_SIZE_Y: usize = 256;

/// Chunk depth along Z, in blocks.
pub const CHUNK_SIZE_Z: usize = 16;

/// Total blocks per chunk.
pub const BLOCKS_PER_CHUNK: usize = CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z;

/// Chunk extents as `[x, y, z]`.
pub const CHUNK_EXTENTS: [usize; 3] = [CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z];

const EXTENT_X: i32 = CHUNK_SIZE_X as i32;
const EXTENT_Y: i32 = CHUNK_SIZE_Y as i32;
const EXTENT_Z: i32 = CHUNK_SIZE_Z as i32;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Y coordinate (in chunks, not blocks).
    pub y: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the world position of the chunk's minimum corner.
    ///
    /// # Panics
    ///
    /// Panics if the chunk is not [addressable](Self::is_addressable).
    #[inline]
    #[must_use]
    pub const fn origin(self) -> WorldPos {
        match self.checked_origin() {
            Some(origin) => origin,
            None => panic!("chunk coordinate outside the addressable world"),
        }
    }

    /// Returns the world position of the chunk's minimum corner, or `None`
    /// if it does not fit in `i32`.
    #[inline]
    #[must_use]
    pub const fn checked_origin(self) -> Option<WorldPos> {
        match (
            self.x.checked_mul(EXTENT_X),
            self.y.checked_mul(EXTENT_Y),
            self.z.checked_mul(EXTENT_Z),
        ) {
            (Some(x), Some(y), Some(z)) => Some(WorldPos { x, y, z }),
            _ => None,
        }
    }

    /// Returns true if every block of the chunk has an `i32` world position.
    ///
    /// Each extent divides `2^32`, so a chunk whose origin fits also fits
    /// its far corner.
    #[inline]
    #[must_use]
    pub const fn is_addressable(self) -> bool {
        self.checked_origin().is_some()
    }

    /// Squared horizontal distance to another chunk, in chunk-grid units.
    ///
    /// Y is ignored: streaming is driven by (x, z) only.
    #[inline]
    #[must_use]
    pub const fn distance_sq_xz(self, other: Self) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dz = self.z as i64 - other.z as i64;
        dx * dx + dz * dz
    }

    /// Returns the coordinate offset by `(dx, dz)` on the horizontal plane.
    ///
    /// Saturates at the ends of the `i32` range.
    #[inline]
    #[must_use]
    pub const fn offset_xz(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y,
            z: self.z.saturating_add(dz),
        }
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// Absolute block position in the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WorldPos {
    /// World X.
    pub x: i32,
    /// World Y.
    pub y: i32,
    /// World Z.
    pub z: i32,
}

impl WorldPos {
    /// Creates a new world position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the block containing a continuous viewer position.
    ///
    /// Each component is floored, so `-0.5` lands in block `-1`.
    #[inline]
    #[must_use]
    pub fn from_viewer(position: [f32; 3]) -> Self {
        Self {
            x: position[0].floor() as i32,
            y: position[1].floor() as i32,
            z: position[2].floor() as i32,
        }
    }

    /// Returns the chunk containing this position.
    #[inline]
    #[must_use]
    pub const fn chunk(self) -> ChunkCoord {
        world_to_chunk(self)
    }

    /// Returns this position relative to its chunk.
    #[inline]
    #[must_use]
    pub const fn local(self) -> LocalPos {
        world_to_local(self)
    }

    /// Rebuilds a world position from a chunk and a local position.
    #[inline]
    #[must_use]
    pub const fn from_parts(chunk: ChunkCoord, local: LocalPos) -> Self {
        let origin = chunk.origin();
        Self {
            x: origin.x + local.x as i32,
            y: origin.y + local.y as i32,
            z: origin.z + local.z as i32,
        }
    }
}

/// Block position inside a chunk.
///
/// Always within the chunk extents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LocalPos {
    x: usize,
    y: usize,
    z: usize,
}

impl LocalPos {
    /// Creates a local position.
    ///
    /// # Panics
    ///
    /// Panics if any component lies outside the chunk extents.
    #[inline]
    #[must_use]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        assert!(
            x < CHUNK_SIZE_X && y < CHUNK_SIZE_Y && z < CHUNK_SIZE_Z,
            "local position out of chunk bounds"
        );
        Self { x, y, z }
    }

    /// Local X (0-15).
    #[inline]
    #[must_use]
    pub const fn x(self) -> usize {
        self.x
    }

    /// Local Y (0-255).
    #[inline]
    #[must_use]
    pub const fn y(self) -> usize {
        self.y
    }

    /// Local Z (0-15).
    #[inline]
    #[must_use]
    pub const fn z(self) -> usize {
        self.z
    }

    /// Index into a chunk's block array: `x + z * SIZE_X + y * SIZE_X * SIZE_Z`.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.x + self.z * CHUNK_SIZE_X + self.y * CHUNK_SIZE_X * CHUNK_SIZE_Z
    }

    /// Inverse of [`index`](Self::index).
    ///
    /// # Panics
    ///
    /// Panics if `index >= BLOCKS_PER_CHUNK`.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        assert!(index < BLOCKS_PER_CHUNK, "block index out of chunk bounds");
        let layer = CHUNK_SIZE_X * CHUNK_SIZE_Z;
        Self {
            x: index % CHUNK_SIZE_X,
            y: index / layer,
            z: (index % layer) / CHUNK_SIZE_X,
        }
    }
}

/// Converts a world position to the coordinate of its chunk.
#[inline]
#[must_use]
pub const fn world_to_chunk(pos: WorldPos) -> ChunkCoord {
    ChunkCoord {
        x: pos.x.div_euclid(EXTENT_X),
        y: pos.y.div_euclid(EXTENT_Y),
        z: pos.z.div_euclid(EXTENT_Z),
    }
}

/// Converts a world position to its position inside its chunk.
#[inline]
#[must_use]
pub const fn world_to_local(pos: WorldPos) -> LocalPos {
    // rem_euclid pairs with div_euclid: never negative
    LocalPos {
        x: pos.x.rem_euclid(EXTENT_X) as usize,
        y: pos.y.rem_euclid(EXTENT_Y) as usize,
        z: pos.z.rem_euclid(EXTENT_Z) as usize,
    }
}
