//! # Terrain Synthesis
//!
//! Height, climate, and block material for any world coordinate.
//!
//! ## Height Layers
//!
//! Surface height is the sea level baseline plus four noise layers, each
//! modelling one geological feature:
//!
//! | Layer       | Scale  | Amplitude | Shaping                   |
//! |-------------|--------|-----------|---------------------------|
//! | Continental | 0.0001 | 30        | none                      |
//! | Mountain    | 0.001  | 100       | squared, sign preserved   |
//! | Hill        | 0.01   | 20        | none                      |
//! | Detail      | 0.1    | 5         | none                      |
//!
//! The weights are world-format constants, not runtime settings.
//!
//! ## Thread Safety
//!
//! A `TerrainGenerator` is immutable after construction. Generation workers
//! share one instance behind an `Arc` and call it concurrently.

use std::fmt;

use crate::biome::{Biome, Climate};
use crate::block::{Block, Material};
use crate::noise::{PerlinNoise, WorldSeed};

/// Sea level baseline for the height function.
pub const SEA_LEVEL: f64 = 64.0;

/// Highest surface the height function can produce.
pub const MAX_HEIGHT: f64 = 255.0;

/// Inverse wavelength of the continental layer.
pub const CONTINENTAL_SCALE: f64 = 0.0001;
/// Height contribution of the continental layer.
pub const CONTINENTAL_AMPLITUDE: f64 = 30.0;
/// Inverse wavelength of the mountain layer.
pub const MOUNTAIN_SCALE: f64 = 0.001;
/// Height contribution of the mountain layer.
pub const MOUNTAIN_AMPLITUDE: f64 = 100.0;
/// Inverse wavelength of the hill layer.
pub const HILL_SCALE: f64 = 0.01;
/// Height contribution of the hill layer.
pub const HILL_AMPLITUDE: f64 = 20.0;
/// Inverse wavelength of the detail layer.
pub const DETAIL_SCALE: f64 = 0.1;
/// Height contribution of the detail layer.
pub const DETAIL_AMPLITUDE: f64 = 5.0;

/// Inverse wavelength of temperature and moisture.
pub const CLIMATE_SCALE: f64 = 0.0005;
/// Offset applied to both axes when sampling moisture.
pub const MOISTURE_OFFSET: f64 = 1000.0;

/// Depth of the dirt layer under the surface block.
pub const SUBSURFACE_DEPTH: f64 = 4.0;

/// Inverse wavelength of the ore field.
pub const ORE_SCALE: f64 = 0.1;
/// Vertical stretch of the ore field (thin horizontal veins).
pub const ORE_Y_STRETCH: f64 = 10.0;
/// Shear mixing `z` into the ore field so veins vary along both horizontal axes.
pub const ORE_Z_SHEAR: f64 = 0.618_034;
/// Offset separating the ore field from the height and climate samples.
pub const ORE_OFFSET: f64 = 5000.0;
/// Amplitude of the ore field.
///
/// Raw Perlin values above 0.85 are vanishingly rare; at this gain the
/// thresholds below are each crossed by a fraction of a percent of stone.
pub const ORE_GAIN: f64 = 1.5;

/// Ore noise value above which diamond ore appears.
pub const DIAMOND_THRESHOLD: f64 = 0.95;
/// Diamond only appears below this altitude.
pub const DIAMOND_MAX_Y: i32 = 32;
/// Ore noise value above which gold ore appears.
pub const GOLD_THRESHOLD: f64 = 0.90;
/// Gold only appears below this altitude.
pub const GOLD_MAX_Y: i32 = 64;
/// Ore noise value above which iron ore appears (any depth).
pub const IRON_THRESHOLD: f64 = 0.85;

/// Height and biome of one world column.
///
/// Everything `block_in_column` needs that does not depend on `y`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSample {
    /// Surface height (clamped to `[0, MAX_HEIGHT]`).
    pub height: f64,
    /// Biome of the column.
    pub biome: Biome,
}

impl ColumnSample {
    /// Altitude of the surface block.
    #[inline]
    #[must_use]
    pub fn surface_y(&self) -> i32 {
        self.height.floor() as i32
    }
}

/// Deterministic terrain generator.
///
/// Holds only the seed and the noise permutation derived from it.
#[derive(Clone)]
pub struct TerrainGenerator {
    seed: WorldSeed,
    noise: PerlinNoise,
}

impl TerrainGenerator {
    /// Creates a new generator for the given seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            seed,
            noise: PerlinNoise::new(seed),
        }
    }

    /// Returns the seed this generator was built from.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Gets the terrain surface height at world coordinates.
    ///
    /// Always in `[0, MAX_HEIGHT]`.
    #[must_use]
    pub fn get_height(&self, x: f64, z: f64) -> f64 {
        let continental = self.noise.sample(x, z, CONTINENTAL_SCALE);

        // Squared with the sign kept: flattens lowlands, sharpens peaks
        let mountain = self.noise.sample(x, z, MOUNTAIN_SCALE);
        let mountain = mountain * mountain.abs();

        let hill = self.noise.sample(x, z, HILL_SCALE);
        let detail = self.noise.sample(x, z, DETAIL_SCALE);

        let height = SEA_LEVEL
            + continental * CONTINENTAL_AMPLITUDE
            + mountain * MOUNTAIN_AMPLITUDE
            + hill * HILL_AMPLITUDE
            + detail * DETAIL_AMPLITUDE;

        height.clamp(0.0, MAX_HEIGHT)
    }

    /// Samples height, temperature, and moisture at world coordinates.
    #[must_use]
    pub fn climate(&self, x: f64, z: f64) -> Climate {
        Climate {
            height: self.get_height(x, z),
            temperature: self.noise.sample(x, z, CLIMATE_SCALE),
            moisture: self.noise.sample(x + MOISTURE_OFFSET, z + MOISTURE_OFFSET, CLIMATE_SCALE),
        }
    }

    /// Gets the biome at world coordinates.
    #[must_use]
    pub fn get_biome(&self, x: f64, z: f64) -> Biome {
        Biome::classify(&self.climate(x, z))
    }

    /// Samples everything about a column that does not depend on altitude.
    #[must_use]
    pub fn sample_column(&self, x: i32, z: i32) -> ColumnSample {
        let climate = self.climate(f64::from(x), f64::from(z));
        ColumnSample {
            height: climate.height,
            biome: Biome::classify(&climate),
        }
    }

    /// Gets the block material at a world position.
    ///
    /// Equivalent to `block_in_column(&sample_column(x, z), x, y, z)`.
    #[must_use]
    pub fn get_block_type(&self, x: i32, y: i32, z: i32) -> Material {
        self.block_in_column(&self.sample_column(x, z), x, y, z)
    }

    /// Gets the block material at altitude `y` of an already sampled column.
    ///
    /// `column` must be the sample for `(x, z)`.
    #[must_use]
    pub fn block_in_column(&self, column: &ColumnSample, x: i32, y: i32, z: i32) -> Material {
        if f64::from(y) > column.height {
            return Material::Air;
        }
        if y == 0 {
            return Material::Bedrock;
        }
        if y == column.surface_y() {
            return column.biome.surface_material(y);
        }
        if f64::from(y) > column.height - SUBSURFACE_DEPTH {
            return Material::Dirt;
        }
        Self::ore_for(self.ore_value(x, y, z), y).unwrap_or(Material::Stone)
    }

    /// Fills a box of blocks whose minimum corner is `origin`.
    ///
    /// `extents` is `[width_x, height_y, depth_z]`; blocks are laid out
    /// x-fastest, then z, then y (`x + z * width_x + y * width_x * depth_z`).
    /// Height and biome are sampled once per column.
    ///
    /// # Panics
    ///
    /// Panics if `blocks` does not hold exactly one entry per position.
    pub fn fill_chunk_blocks(&self, origin: [i32; 3], extents: [usize; 3], blocks: &mut [Block]) {
        let [width_x, height_y, depth_z] = extents;
        assert_eq!(
            blocks.len(),
            width_x * height_y * depth_z,
            "block buffer does not match extents {extents:?}"
        );

        let layer = width_x * depth_z;
        for lz in 0..depth_z {
            let z = origin[2] + lz as i32;
            for lx in 0..width_x {
                let x = origin[0] + lx as i32;
                let column = self.sample_column(x, z);
                for ly in 0..height_y {
                    let y = origin[1] + ly as i32;
                    blocks[lx + lz * width_x + ly * layer] =
                        Block::new(self.block_in_column(&column, x, y, z));
                }
            }
        }
    }

    /// Samples the ore field at a world position.
    ///
    /// Values lie in `[-ORE_GAIN, ORE_GAIN]`.
    #[must_use]
    pub fn ore_value(&self, x: i32, y: i32, z: i32) -> f64 {
        let u = f64::from(x) + f64::from(z) * ORE_Z_SHEAR + ORE_OFFSET;
        let v = f64::from(y) * ORE_Y_STRETCH + f64::from(z) * ORE_Z_SHEAR;
        self.noise.sample(u, v, ORE_SCALE) * ORE_GAIN
    }

    /// Picks the ore for an ore-field value at altitude `y`, if any.
    ///
    /// Checked rarest first so a higher threshold is never shadowed by a
    /// lower one.
    #[must_use]
    pub fn ore_for(value: f64, y: i32) -> Option<Material> {
        if value > DIAMOND_THRESHOLD && y < DIAMOND_MAX_Y {
            Some(Material::DiamondOre)
        } else if value > GOLD_THRESHOLD && y < GOLD_MAX_Y {
            Some(Material::GoldOre)
        } else if value > IRON_THRESHOLD {
            Some(Material::IronOre)
        } else {
            None
        }
    }
}

impl fmt::Debug for TerrainGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerrainGenerator")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_height_is_pure() {
        let gen = TerrainGenerator::new(WorldSeed::new(42));

        let first = gen.get_height(0.0, 0.0);
        for _ in 0..10 {
            assert_eq!(gen.get_height(0.0, 0.0).to_bits(), first.to_bits());
        }

        // Call order must not matter
        let a = gen.get_height(1234.5, -987.25);
        let _ = gen.get_height(17.0, 3.0);
        assert_eq!(gen.get_height(1234.5, -987.25).to_bits(), a.to_bits());
    }

    #[test]
    fn test_origin_sits_at_sea_level() {
        // Every layer samples an integer lattice point at the origin
        let gen = TerrainGenerator::new(WorldSeed::new(42));
        assert_eq!(gen.get_height(0.0, 0.0), SEA_LEVEL);
    }

    #[test]
    fn test_height_is_thread_independent() {
        let gen = Arc::new(TerrainGenerator::new(WorldSeed::new(42)));
        let points: Vec<(f64, f64)> = (0..64)
            .map(|i| (f64::from(i) * 37.3 - 900.0, f64::from(i) * -11.9 + 40.0))
            .collect();
        let expected: Vec<u64> = points
            .iter()
            .map(|&(x, z)| gen.get_height(x, z).to_bits())
            .collect();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gen = Arc::clone(&gen);
                let points = points.clone();
                thread::spawn(move || {
                    points
                        .iter()
                        .rev()
                        .map(|&(x, z)| gen.get_height(x, z).to_bits())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            let mut observed = handle.join().unwrap();
            observed.reverse();
            assert_eq!(observed, expected);
        }
    }

    #[test]
    fn test_height_range() {
        let gen = TerrainGenerator::new(WorldSeed::new(9));

        for i in -500..500 {
            let x = f64::from(i) * 97.0;
            let z = f64::from(i) * -61.0;
            let height = gen.get_height(x, z);
            assert!(
                (0.0..=MAX_HEIGHT).contains(&height),
                "Height {height} out of range at ({x}, {z})"
            );
        }
    }

    #[test]
    fn test_seed_42_example_blocks() {
        let gen = TerrainGenerator::new(WorldSeed::new(42));

        let height = gen.get_height(0.0, 0.0);
        assert_eq!(gen.get_block_type(0, 0, 0), Material::Bedrock);
        assert_eq!(gen.get_block_type(0, height as i32 + 1, 0), Material::Air);
    }

    #[test]
    fn test_column_layers() {
        let gen = TerrainGenerator::new(WorldSeed::new(77));

        for i in 0..40 {
            let x = i * 53 - 800;
            let z = i * 29 + 100;
            let column = gen.sample_column(x, z);
            let surface = column.surface_y();
            if surface < 8 {
                continue;
            }

            assert_eq!(gen.block_in_column(&column, x, surface + 1, z), Material::Air);
            assert_eq!(
                gen.block_in_column(&column, x, surface, z),
                column.biome.surface_material(surface)
            );
            assert_eq!(gen.block_in_column(&column, x, surface - 1, z), Material::Dirt);
            assert_eq!(gen.block_in_column(&column, x, 0, z), Material::Bedrock);

            let deep = gen.block_in_column(&column, x, surface - 6, z);
            assert!(
                matches!(
                    deep,
                    Material::Stone | Material::IronOre | Material::GoldOre | Material::DiamondOre
                ),
                "unexpected deep block {deep:?}"
            );
        }
    }

    #[test]
    fn test_column_path_matches_block_type() {
        let gen = TerrainGenerator::new(WorldSeed::new(5));

        for i in 0..20 {
            let x = i * 211 - 2000;
            let z = i * -137 + 500;
            let column = gen.sample_column(x, z);
            for y in (0..256).step_by(7) {
                assert_eq!(gen.block_in_column(&column, x, y, z), gen.get_block_type(x, y, z));
            }
        }
    }

    #[test]
    fn test_biome_matches_climate() {
        let gen = TerrainGenerator::new(WorldSeed::new(12345));

        for i in 0..50 {
            let x = f64::from(i) * 400.0;
            let z = f64::from(i) * -250.0;
            let climate = gen.climate(x, z);
            assert_eq!(gen.get_biome(x, z), Biome::classify(&climate));
            if climate.height < SEA_LEVEL {
                assert_eq!(gen.get_biome(x, z), Biome::Underground);
            }
        }
    }

    #[test]
    fn test_fill_matches_point_queries() {
        let gen = TerrainGenerator::new(WorldSeed::new(42));
        let origin = [-16, 0, 32];
        let extents = [4, 256, 3];
        let mut blocks = vec![Block::AIR; 4 * 256 * 3];

        gen.fill_chunk_blocks(origin, extents, &mut blocks);

        for ly in [0usize, 1, 40, 63, 64, 65, 90, 255] {
            for lz in 0..3usize {
                for lx in 0..4usize {
                    let expected = gen.get_block_type(
                        origin[0] + lx as i32,
                        ly as i32,
                        origin[2] + lz as i32,
                    );
                    assert_eq!(blocks[lx + lz * 4 + ly * 12].material(), expected);
                }
            }
        }
    }

    #[test]
    #[should_panic(expected = "does not match extents")]
    fn test_fill_rejects_wrong_buffer() {
        let gen = TerrainGenerator::new(WorldSeed::new(1));
        let mut blocks = vec![Block::AIR; 10];
        gen.fill_chunk_blocks([0, 0, 0], [2, 2, 2], &mut blocks);
    }

    #[test]
    fn test_every_ore_occurs_at_its_depth() {
        let gen = TerrainGenerator::new(WorldSeed::new(42));
        let origin = [-32, 1, -32];
        let extents = [64, 39, 64];
        let mut blocks = vec![Block::AIR; extents[0] * extents[1] * extents[2]];
        gen.fill_chunk_blocks(origin, extents, &mut blocks);

        let layer = extents[0] * extents[2];
        let mut counts = std::collections::HashMap::new();
        for (index, block) in blocks.iter().enumerate() {
            let y = origin[1] + (index / layer) as i32;
            match block.material() {
                Material::DiamondOre => assert!(y < DIAMOND_MAX_Y, "diamond at y={y}"),
                Material::GoldOre => assert!(y < GOLD_MAX_Y, "gold at y={y}"),
                _ => {}
            }
            *counts.entry(block.material()).or_insert(0usize) += 1;
        }

        let count = |material: Material| counts.get(&material).copied().unwrap_or(0);
        assert!(count(Material::IronOre) > 0, "no iron: {counts:?}");
        assert!(count(Material::GoldOre) > 0, "no gold: {counts:?}");
        assert!(count(Material::DiamondOre) > 0, "no diamond: {counts:?}");

        let ores =
            count(Material::IronOre) + count(Material::GoldOre) + count(Material::DiamondOre);
        assert!(ores * 10 < count(Material::Stone), "ore should stay rare: {counts:?}");

        // Point queries agree with the bulk fill
        let diamond = blocks
            .iter()
            .position(|b| b.material() == Material::DiamondOre)
            .unwrap();
        let (x, y, z) = (
            origin[0] + (diamond % extents[0]) as i32,
            origin[1] + (diamond / layer) as i32,
            origin[2] + ((diamond / extents[0]) % extents[2]) as i32,
        );
        assert_eq!(gen.get_block_type(x, y, z), Material::DiamondOre);
    }

    #[test]
    fn test_ore_precedence() {
        // Rarest first
        assert_eq!(TerrainGenerator::ore_for(0.97, 10), Some(Material::DiamondOre));
        // Too shallow for diamond, still deep enough for gold
        assert_eq!(TerrainGenerator::ore_for(0.97, 40), Some(Material::GoldOre));
        // Too shallow for gold
        assert_eq!(TerrainGenerator::ore_for(0.97, 100), Some(Material::IronOre));
        assert_eq!(TerrainGenerator::ore_for(0.92, 10), Some(Material::GoldOre));
        assert_eq!(TerrainGenerator::ore_for(0.86, 10), Some(Material::IronOre));
        assert_eq!(TerrainGenerator::ore_for(0.85, 10), None);
        assert_eq!(TerrainGenerator::ore_for(-0.9, 10), None);
    }
}
