//! # Strata World
//!
//! Chunk streaming for an unbounded voxel world.
//!
//! ## Design Principles
//!
//! 1. **Viewer-driven**: chunks near the viewer are created, distant ones evicted
//! 2. **Non-blocking**: new chunks are returned at once and filled in the background
//! 3. **Generated once**: a chunk is synthesized at most once per residency
//! 4. **Durable edits**: dirty chunks are saved on eviction and restored on return
//!
//! ## Core Components
//!
//! - `ChunkStore`: resident map, streaming, block access, save/load
//! - `Chunk` / `ChunkHandle`: block storage and shared access to it
//! - `WorldPos` / `ChunkCoord` / `LocalPos`: floor-consistent coordinate split
//! - `StoreConfig`: radii, worker count, save directory
//!
//! ## Example
//!
//! ```rust
//! use strata_terrain::{Material, WorldSeed};
//! use strata_world::{ChunkStore, StoreConfig, WorldPos};
//!
//! let store = ChunkStore::new(WorldSeed::new(42), StoreConfig::test())?;
//!
//! // Viewer at the origin
//! store.update([0.0, 70.0, 0.0], 1.0 / 20.0);
//! store.flush_generation_queue();
//!
//! store.set_block(WorldPos::new(3, 100, -2), Material::Glass);
//! assert_eq!(
//!     store.get_block(WorldPos::new(3, 100, -2)).map(|b| b.material()),
//!     Some(Material::Glass)
//! );
//! # Ok::<(), strata_world::WorldError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod config;
pub mod coords;
pub mod error;
pub mod persistence;
pub mod store;
mod worker;

pub use chunk::{Chunk, ChunkHandle};
pub use config::StoreConfig;
pub use coords::{
    world_to_chunk, world_to_local, ChunkCoord, LocalPos, WorldPos, BLOCKS_PER_CHUNK,
    CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z,
};
pub use error::{WorldError, WorldResult};
pub use store::{ChunkStore, StoreStats, StreamingReport};
