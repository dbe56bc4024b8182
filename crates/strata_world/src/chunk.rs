//! # Chunk Storage
//!
//! A chunk is a 16x256x16 block array plus its lifecycle flags.
//!
//! ## Lifecycle
//!
//! 1. Created empty (all air), `generated = false`
//! 2. A generation worker synthesizes (or restores) the blocks, and the
//!    store installs them: `generated = true`
//! 3. Writes set `dirty = true`
//! 4. On eviction a dirty chunk is saved, then dropped
//!
//! Writes made before step 2 are remembered and replayed on top of the
//! installed blocks, so an early `set_block` is never overwritten by the
//! terrain.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use strata_terrain::Block;

use crate::coords::{ChunkCoord, LocalPos, BLOCKS_PER_CHUNK, CHUNK_SIZE_Y};

/// A chunk of world data.
pub struct Chunk {
    coord: ChunkCoord,
    /// Indexed by [`LocalPos::index`].
    blocks: Box<[Block]>,
    generated: bool,
    dirty: bool,
    /// Bumped on every write; lets a save tell whether it is still current.
    revision: u64,
    /// Writes made while ungenerated, by block index (last write wins),
    /// replayed on install.
    early_writes: HashMap<usize, Block>,
}

impl Chunk {
    /// Creates a new empty chunk at the given coordinates.
    #[must_use]
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            blocks: vec![Block::AIR; BLOCKS_PER_CHUNK].into_boxed_slice(),
            generated: false,
            dirty: false,
            revision: 0,
            early_writes: HashMap::new(),
        }
    }

    /// Returns the chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Returns true once terrain has been generated or restored.
    #[inline]
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        self.generated
    }

    /// Returns true if the chunk has writes not yet saved.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the write counter.
    #[inline]
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the whole block array, indexed by [`LocalPos::index`].
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Gets a block at a local position.
    #[inline]
    #[must_use]
    pub fn get(&self, pos: LocalPos) -> Block {
        self.blocks[pos.index()]
    }

    /// Sets a block at a local position and marks the chunk dirty.
    pub fn set(&mut self, pos: LocalPos, block: Block) {
        let index = pos.index();
        self.blocks[index] = block;
        if !self.generated {
            self.early_writes.insert(index, block);
        }
        self.dirty = true;
        self.revision += 1;
    }

    /// Number of non-air blocks.
    #[must_use]
    pub fn solid_count(&self) -> usize {
        self.blocks.iter().filter(|b| !b.is_air()).count()
    }

    /// Highest non-air block in a column, as a local Y.
    #[must_use]
    pub fn surface_y(&self, x: usize, z: usize) -> Option<usize> {
        (0..CHUNK_SIZE_Y)
            .rev()
            .find(|&y| !self.get(LocalPos::new(x, y, z)).is_air())
    }

    /// Installs freshly generated or restored blocks.
    ///
    /// Early writes are replayed on top and keep the chunk dirty.
    pub(crate) fn install_generated(&mut self, blocks: Box<[Block]>) {
        debug_assert_eq!(blocks.len(), BLOCKS_PER_CHUNK);
        self.blocks = blocks;
        for (index, block) in self.early_writes.drain() {
            self.blocks[index] = block;
        }
        self.generated = true;
    }

    /// Replaces the chunk contents with a saved image, discarding any
    /// unsaved writes.
    pub(crate) fn restore(&mut self, blocks: Box<[Block]>) {
        debug_assert_eq!(blocks.len(), BLOCKS_PER_CHUNK);
        self.blocks = blocks;
        self.early_writes.clear();
        self.generated = true;
        self.dirty = false;
        self.revision += 1;
    }

    /// Clears the dirty flag if nothing was written since `revision`.
    pub(crate) fn mark_saved(&mut self, revision: u64) -> bool {
        if self.revision == revision {
            self.dirty = false;
            true
        } else {
            false
        }
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("coord", &self.coord)
            .field("generated", &self.generated)
            .field("dirty", &self.dirty)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

/// Shared reference to a resident chunk.
///
/// Cloning is cheap. Consumers should hold a handle only for the duration
/// of one operation: after eviction the handle keeps the memory alive, but
/// the chunk is no longer part of the world.
#[derive(Clone)]
pub struct ChunkHandle {
    coord: ChunkCoord,
    inner: Arc<RwLock<Chunk>>,
}

impl ChunkHandle {
    pub(crate) fn new(chunk: Chunk) -> Self {
        Self {
            coord: chunk.coord(),
            inner: Arc::new(RwLock::new(chunk)),
        }
    }

    /// Returns the chunk coordinate without locking.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Locks the chunk for reading.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Chunk> {
        self.inner.read()
    }

    /// Locks the chunk for writing.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Chunk> {
        self.inner.write()
    }

    /// Returns true if both handles refer to the same chunk instance.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<RwLock<Chunk>> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn is_instance(&self, target: &Arc<RwLock<Chunk>>) -> bool {
        Arc::ptr_eq(&self.inner, target)
    }
}

impl std::fmt::Debug for ChunkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ChunkHandle").field(&self.coord).finish()
    }
}
