//! # Strata Terrain
//!
//! Deterministic terrain for an infinite voxel world.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same world
//! 2. **Pure**: No threads, no I/O, no interior mutability
//! 3. **Column-oriented**: Height and biome are computed once per column
//!
//! ## Core Components
//!
//! - `PerlinNoise`: seeded 2D gradient noise
//! - `TerrainGenerator`: height, climate, biome and block material
//! - `Biome`: climate classification and surface materials
//! - `StructureKind`: grid-based dungeon and town placement
//!
//! ## Example
//!
//! ```rust
//! use strata_terrain::{Material, TerrainGenerator, WorldSeed};
//!
//! let generator = TerrainGenerator::new(WorldSeed::new(42));
//! let height = generator.get_height(0.0, 0.0);
//!
//! assert_eq!(generator.get_block_type(0, 0, 0), Material::Bedrock);
//! assert_eq!(generator.get_block_type(0, height as i32 + 1, 0), Material::Air);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod block;
pub mod noise;
pub mod structures;
pub mod terrain;

pub use biome::{Biome, Climate};
pub use block::{Block, Material, MAX_LIGHT};
pub use noise::{PerlinNoise, WorldSeed};
pub use structures::StructureKind;
pub use terrain::{ColumnSample, TerrainGenerator, MAX_HEIGHT, SEA_LEVEL};
