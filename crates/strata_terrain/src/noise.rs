//! # Perlin Noise Implementation
//!
//! Classic gradient noise over a seeded permutation table.
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, this implementation will produce
//! **exactly** the same values on any platform, any time, from any thread.
//! The generator holds no mutable state after construction.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., structure placement).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

impl From<u64> for WorldSeed {
    fn from(seed: u64) -> Self {
        Self(seed)
    }
}

/// Number of distinct permutation entries.
const PERMUTATION_SIZE: usize = 256;

/// Pre-computed permutation table for noise.
///
/// 256 shuffled values, duplicated once so that `perm[i + 1]` never
/// needs a wrap-around check.
#[derive(Clone)]
struct PermutationTable {
    perm: [u8; PERMUTATION_SIZE * 2],
}

impl PermutationTable {
    /// Creates a new permutation table from a seed.
    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; PERMUTATION_SIZE * 2];

        for (i, slot) in perm.iter_mut().take(PERMUTATION_SIZE).enumerate() {
            *slot = i as u8;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed.value());
        perm[..PERMUTATION_SIZE].shuffle(&mut rng);

        let (low, high) = perm.split_at_mut(PERMUTATION_SIZE);
        high.copy_from_slice(low);

        Self { perm }
    }

    #[inline]
    fn get(&self, index: usize) -> usize {
        usize::from(self.perm[index])
    }
}

/// 2D Perlin noise generator.
///
/// Produces smooth, continuous noise values roughly in the range [-1, 1],
/// exactly zero on integer lattice points.
///
/// # Example
///
/// ```rust
/// use strata_terrain::{PerlinNoise, WorldSeed};
///
/// let noise = PerlinNoise::new(WorldSeed::new(42));
/// let value = noise.sample(100.5, 200.25, 0.01);
/// assert_eq!(value, noise.sample(100.5, 200.25, 0.01));
/// ```
#[derive(Clone)]
pub struct PerlinNoise {
    perm_table: PermutationTable,
}

impl PerlinNoise {
    /// Creates a new Perlin noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 2D noise at `(x, y)` after multiplying both by `scale`.
    ///
    /// `scale` is the inverse wavelength: `0.001` gives features roughly a
    /// thousand units across.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64, scale: f64) -> f64 {
        let x = x * scale;
        let y = y * scale;

        let x_floor = x.floor();
        let y_floor = y.floor();

        // Lattice cell, wrapped into the table
        let xi = (x_floor as i64 & 255) as usize;
        let yi = (y_floor as i64 & 255) as usize;

        // Position inside the cell
        let xf = x - x_floor;
        let yf = y - y_floor;

        let u = fade(xf);
        let v = fade(yf);

        let p = &self.perm_table;
        let a = p.get(xi) + yi;
        let aa = p.get(a);
        let ab = p.get(a + 1);
        let b = p.get(xi + 1) + yi;
        let ba = p.get(b);
        let bb = p.get(b + 1);

        lerp(
            v,
            lerp(u, grad(p.get(aa), xf, yf), grad(p.get(ba), xf - 1.0, yf)),
            lerp(
                u,
                grad(p.get(ab), xf, yf - 1.0),
                grad(p.get(bb), xf - 1.0, yf - 1.0),
            ),
        )
    }
}

/// Quintic fade curve `6t^5 - 15t^4 + 10t^3`.
#[inline]
#[must_use]
pub fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product of the offset with one of the gradient directions picked by
/// the low four bits of `hash`.
#[inline]
fn grad(hash: usize, x: f64, y: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        0.0
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}
