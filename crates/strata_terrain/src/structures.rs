//! # Structure Placement
//!
//! Dungeons and towns are placed on coarse grids. Each grid cell holds at
//! most one site, picked by a random generator seeded from the world seed
//! and the cell position, so a site can be found without generating any
//! neighbouring terrain.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::noise::WorldSeed;
use crate::terrain::TerrainGenerator;

/// Side length of a dungeon placement cell, in blocks.
pub const DUNGEON_CELL_SIZE: i32 = 500;

/// Side length of a town placement cell, in blocks.
pub const TOWN_CELL_SIZE: i32 = 2000;

/// Lowest surface height a town accepts.
pub const TOWN_MIN_HEIGHT: f64 = 60.0;

/// Highest surface height a town accepts.
pub const TOWN_MAX_HEIGHT: f64 = 100.0;

/// Hash multiplier for the cell X coordinate.
const CELL_PRIME_X: i64 = 73_856_093;

/// Hash multiplier for the cell Z coordinate.
const CELL_PRIME_Z: i64 = 19_349_663;

/// Kind of placed structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructureKind {
    /// Underground dungeon.
    Dungeon,
    /// Surface town.
    Town,
}

impl StructureKind {
    /// Side length of this kind's placement cell.
    #[inline]
    #[must_use]
    pub const fn cell_size(self) -> i32 {
        match self {
            Self::Dungeon => DUNGEON_CELL_SIZE,
            Self::Town => TOWN_CELL_SIZE,
        }
    }

    /// Seed-derivation purpose, keeping dungeon and town streams apart.
    const fn salt(self) -> u64 {
        match self {
            Self::Dungeon => 0x4455_4E47_454F_4E53,
            Self::Town => 0x544F_574E_5349_5445,
        }
    }

    /// Returns the placement cell containing a world column.
    #[inline]
    #[must_use]
    pub const fn cell_of(self, x: i32, z: i32) -> (i32, i32) {
        let size = self.cell_size();
        (x.div_euclid(size), z.div_euclid(size))
    }

    /// Returns the world column of the one site in a placement cell.
    #[must_use]
    pub fn site(self, seed: WorldSeed, cell_x: i32, cell_z: i32) -> (i32, i32) {
        let cell_hash =
            (i64::from(cell_x) * CELL_PRIME_X) ^ (i64::from(cell_z) * CELL_PRIME_Z);
        let mut rng = ChaCha8Rng::seed_from_u64(
            seed.derive(self.salt()).derive(cell_hash as u64).value(),
        );

        let size = self.cell_size();
        let offset_x = rng.gen_range(0..size);
        let offset_z = rng.gen_range(0..size);
        (cell_x * size + offset_x, cell_z * size + offset_z)
    }

    /// Returns true if `(x, z)` is the site of its cell.
    #[must_use]
    pub fn is_site(self, seed: WorldSeed, x: i32, z: i32) -> bool {
        let (cell_x, cell_z) = self.cell_of(x, z);
        self.site(seed, cell_x, cell_z) == (x, z)
    }
}

impl TerrainGenerator {
    /// Returns the dungeon site of a dungeon cell.
    #[must_use]
    pub fn dungeon_site(&self, cell_x: i32, cell_z: i32) -> (i32, i32) {
        StructureKind::Dungeon.site(self.seed(), cell_x, cell_z)
    }

    /// Returns the town site of a town cell.
    ///
    /// The site only hosts a town if its height is inside the town band.
    #[must_use]
    pub fn town_site(&self, cell_x: i32, cell_z: i32) -> (i32, i32) {
        StructureKind::Town.site(self.seed(), cell_x, cell_z)
    }

    /// Returns true if a dungeon spawns at world column `(x, z)`.
    ///
    /// Exactly one column per 500x500 cell qualifies.
    #[must_use]
    pub fn should_spawn_dungeon(&self, x: i32, z: i32) -> bool {
        StructureKind::Dungeon.is_site(self.seed(), x, z)
    }

    /// Returns true if a town spawns at world column `(x, z)`.
    ///
    /// At most one column per 2000x2000 cell qualifies, and only when its
    /// surface height lies in `[TOWN_MIN_HEIGHT, TOWN_MAX_HEIGHT]`.
    #[must_use]
    pub fn should_spawn_town(&self, x: i32, z: i32) -> bool {
        if !StructureKind::Town.is_site(self.seed(), x, z) {
            return false;
        }
        let height = self.get_height(f64::from(x), f64::from(z));
        (TOWN_MIN_HEIGHT..=TOWN_MAX_HEIGHT).contains(&height)
    }
}
