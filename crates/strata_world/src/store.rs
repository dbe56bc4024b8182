//! # Chunk Store
//!
//! Owns every resident chunk and keeps the resident set around a moving
//! viewer.
//!
//! ## Locking
//!
//! The coordinate map is the one contended resource. It sits behind a
//! single mutex, held for one map operation at a time and never across
//! terrain synthesis or disk I/O. Creating a chunk and queueing its
//! generation job happen inside the same critical section, so a coordinate
//! is generated at most once per residency and no job is ever lost.
//!
//! No chunk lock is taken while the map is held. The worker pool lock is
//! only ever taken inside the map lock (to queue a job) or alone.
//!
//! ## Eviction Races
//!
//! A queued chunk may be evicted before a worker reaches it. The job only
//! holds a weak reference, so the worker sees the chunk is gone and skips
//! it; a result that arrives after eviction is dropped at install time
//! because the map no longer holds that instance.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use parking_lot::{Mutex, RwLock};
use strata_terrain::{Block, TerrainGenerator, WorldSeed};
use tracing::{debug, info, trace, warn};

use crate::chunk::{Chunk, ChunkHandle};
use crate::config::StoreConfig;
use crate::coords::{ChunkCoord, WorldPos};
use crate::error::WorldResult;
use crate::persistence::{encode_blocks, read_chunk_file, write_chunk_bytes};
use crate::worker::{BlockSource, GenerationJob, GenerationPool, GenerationResult};

/// How long `flush_generation_queue` waits per receive before re-checking.
const FLUSH_POLL: Duration = Duration::from_millis(10);

/// What one `update` call changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingReport {
    /// Chunks created (and queued) this update.
    pub created: usize,
    /// Chunks evicted this update.
    pub evicted: usize,
    /// Evicted chunks written to disk.
    pub saved: usize,
}

/// Snapshot of store statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StoreStats {
    /// Chunks currently in the map (generated or not).
    pub resident: usize,
    /// Jobs queued or in flight whose results have not been collected.
    pub pending_generation: usize,
    /// Terrain synthesis passes run by the workers.
    pub generated_this_session: u64,
    /// Generation jobs that panicked; their chunks stay ungenerated.
    pub failed_generations: u64,
    /// Chunks filled from save files instead of generated.
    pub restored_this_session: u64,
    /// Chunks evicted by `update`.
    pub evicted_this_session: u64,
    /// Chunk files written.
    pub saved_this_session: u64,
    /// Chunk saves that failed.
    pub save_failures: u64,
    /// Sum of `delta_time` over all updates.
    pub simulated_seconds: f64,
}

#[derive(Default)]
struct Counters {
    restored: AtomicU64,
    evicted: AtomicU64,
    saved: AtomicU64,
    save_failures: AtomicU64,
}

/// Streaming store of world chunks.
///
/// All methods take `&self`; the store can be shared between threads. The
/// game loop is expected to own `update` and block edits; concurrent edits
/// of the same block from several threads are serialized only per chunk.
///
/// # Example
///
/// ```rust
/// use strata_terrain::{Material, WorldSeed};
/// use strata_world::{ChunkStore, StoreConfig, WorldPos};
///
/// let store = ChunkStore::new(WorldSeed::new(42), StoreConfig::test())?;
/// store.update([0.0, 70.0, 0.0], 0.05);
/// store.flush_generation_queue();
///
/// assert_eq!(
///     store.get_block(WorldPos::new(0, 0, 0)).map(|b| b.material()),
///     Some(Material::Bedrock)
/// );
/// # Ok::<(), strata_world::WorldError>(())
/// ```
pub struct ChunkStore {
    chunks: Mutex<HashMap<ChunkCoord, ChunkHandle>>,
    config: RwLock<StoreConfig>,
    generator: Arc<TerrainGenerator>,
    pool: Mutex<GenerationPool>,
    results: Receiver<GenerationResult>,
    /// Jobs sent whose results have not been collected yet.
    pending: AtomicUsize,
    counters: Counters,
    simulated_seconds: Mutex<f64>,
}

impl ChunkStore {
    /// Creates a store generating terrain from `seed`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` fails validation.
    pub fn new(seed: WorldSeed, config: StoreConfig) -> WorldResult<Self> {
        Self::with_generator(Arc::new(TerrainGenerator::new(seed)), config)
    }

    /// Creates a store around an existing generator.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` fails validation.
    pub fn with_generator(
        generator: Arc<TerrainGenerator>,
        config: StoreConfig,
    ) -> WorldResult<Self> {
        config.validate()?;

        let (result_tx, results) = unbounded();
        let pool = GenerationPool::new(Arc::clone(&generator), config.worker_count, result_tx);

        info!(
            seed = generator.seed().value(),
            workers = config.worker_count,
            load_radius = config.load_radius,
            unload_radius = config.unload_radius,
            "chunk store started"
        );

        Ok(Self {
            chunks: Mutex::new(HashMap::new()),
            config: RwLock::new(config),
            generator,
            pool: Mutex::new(pool),
            results,
            pending: AtomicUsize::new(0),
            counters: Counters::default(),
            simulated_seconds: Mutex::new(0.0),
        })
    }

    /// Returns the terrain generator.
    #[must_use]
    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> StoreConfig {
        self.config.read().clone()
    }

    /// Replaces the configuration.
    ///
    /// Radii and worker count take effect on the next `update`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` and keeps the old configuration if `config`
    /// fails validation.
    pub fn reconfigure(&self, config: StoreConfig) -> WorldResult<()> {
        config.validate()?;
        info!(
            workers = config.worker_count,
            load_radius = config.load_radius,
            unload_radius = config.unload_radius,
            "store reconfigured"
        );
        *self.config.write() = config;
        Ok(())
    }

    // =========================================================================
    // Chunk access
    // =========================================================================

    /// Returns the chunk if resident. No side effects.
    #[must_use]
    pub fn get_chunk(&self, coord: ChunkCoord) -> Option<ChunkHandle> {
        self.chunks.lock().get(&coord).cloned()
    }

    /// Returns true if a chunk is resident at `coord`.
    #[must_use]
    pub fn is_resident(&self, coord: ChunkCoord) -> bool {
        self.chunks.lock().contains_key(&coord)
    }

    /// Runs `f` against a resident chunk under its read lock.
    pub fn with_chunk<R>(&self, coord: ChunkCoord, f: impl FnOnce(&Chunk) -> R) -> Option<R> {
        let handle = self.get_chunk(coord)?;
        let chunk = handle.read();
        Some(f(&chunk))
    }

    /// Returns the resident chunk, creating it if absent.
    ///
    /// A new chunk is empty and queued for generation; it is returned
    /// immediately, before any worker has filled it.
    pub fn get_or_create_chunk(&self, coord: ChunkCoord) -> ChunkHandle {
        let restore_from = self.config.read().save_directory.clone();
        self.get_or_create_with(coord, restore_from).0
    }

    /// Returns the chunk and whether this call created it.
    fn get_or_create_with(
        &self,
        coord: ChunkCoord,
        restore_from: Option<PathBuf>,
    ) -> (ChunkHandle, bool) {
        let mut chunks = self.chunks.lock();
        if let Some(handle) = chunks.get(&coord) {
            return (handle.clone(), false);
        }

        let handle = ChunkHandle::new(Chunk::new(coord));
        chunks.insert(coord, handle.clone());

        // Queue under the same lock as the insert
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.pool.lock().submit(GenerationJob {
            coord,
            target: handle.downgrade(),
            restore_from,
        });

        (handle, true)
    }

    /// Gets the block at a world position.
    ///
    /// Returns `None` if the chunk is not resident; never creates one.
    #[must_use]
    pub fn get_block(&self, pos: WorldPos) -> Option<Block> {
        let handle = self.get_chunk(pos.chunk())?;
        let block = handle.read().get(pos.local());
        Some(block)
    }

    /// Sets the block at a world position, creating the chunk if needed.
    ///
    /// Marks the chunk dirty.
    pub fn set_block(&self, pos: WorldPos, block: impl Into<Block>) {
        let handle = self.get_or_create_chunk(pos.chunk());
        handle.write().set(pos.local(), block.into());
    }

    /// Returns every resident, generated chunk.
    ///
    /// Intended for mesh building: hold the handles only until the mesh is
    /// built.
    #[must_use]
    pub fn loaded_chunks(&self) -> Vec<ChunkHandle> {
        let handles: Vec<ChunkHandle> = self.chunks.lock().values().cloned().collect();
        handles
            .into_iter()
            .filter(|handle| handle.read().is_generated())
            .collect()
    }

    /// Number of resident chunks, generated or not.
    #[must_use]
    pub fn resident_count(&self) -> usize {
        self.chunks.lock().len()
    }

    // =========================================================================
    // Streaming
    // =========================================================================

    /// Installs every finished generation result without blocking.
    ///
    /// Returns the number of chunks installed.
    pub fn collect_generated(&self) -> usize {
        let mut installed = 0;
        while let Ok(result) = self.results.try_recv() {
            if self.install(result) {
                installed += 1;
            }
        }
        installed
    }

    /// Blocks until every queued chunk has been generated and installed.
    pub fn flush_generation_queue(&self) {
        while self.pending.load(Ordering::Acquire) > 0 {
            match self.results.recv_timeout(FLUSH_POLL) {
                Ok(result) => {
                    self.install(result);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn install(&self, result: GenerationResult) -> bool {
        self.pending.fetch_sub(1, Ordering::AcqRel);

        let (coord, target, blocks, source) = match result {
            GenerationResult::Completed {
                coord,
                target,
                blocks,
                source,
            } => (coord, target, blocks, source),
            GenerationResult::Skipped { coord } => {
                trace!(%coord, "generation skipped");
                return false;
            }
        };

        let Some(target) = target.upgrade() else {
            trace!(%coord, "chunk evicted before install");
            return false;
        };
        let resident = self
            .chunks
            .lock()
            .get(&coord)
            .is_some_and(|handle| handle.is_instance(&target));
        if !resident {
            trace!(%coord, "chunk evicted before install");
            return false;
        }

        let mut chunk = target.write();
        if chunk.is_generated() {
            // Explicit load_chunk got there first
            return false;
        }
        chunk.install_generated(blocks);
        if source == BlockSource::Restored {
            self.counters.restored.fetch_add(1, Ordering::Relaxed);
        }
        true
    }

    /// Recomputes the resident set around the viewer.
    ///
    /// Installs finished chunks, applies configuration changes, creates and
    /// queues every chunk within the load radius of the viewer's chunk
    /// (nearest first), and evicts chunks beyond the unload radius, saving
    /// dirty ones when a save directory is configured.
    pub fn update(&self, viewer: [f32; 3], delta_time: f32) -> StreamingReport {
        self.collect_generated();

        let config = self.config();
        self.pool.lock().resize(config.worker_count);
        *self.simulated_seconds.lock() += f64::from(delta_time);

        let center = WorldPos::from_viewer(viewer).chunk();

        let created = self.load_around(center, &config);
        let evicted = self.evict_outside(center, &config);
        let evicted_count = evicted.len();

        let saved = match &config.save_directory {
            Some(dir) => evicted
                .iter()
                .filter(|handle| handle.read().is_dirty())
                .filter(|handle| self.save_evicted(handle, dir))
                .count(),
            None => {
                let lost = evicted.iter().filter(|h| h.read().is_dirty()).count();
                if lost > 0 {
                    debug!(lost, "evicted dirty chunks with no save directory");
                }
                0
            }
        };

        if evicted_count > 0 {
            debug!(%center, evicted = evicted_count, saved, "evicted chunks");
        }

        StreamingReport {
            created,
            evicted: evicted_count,
            saved,
        }
    }

    fn load_around(&self, center: ChunkCoord, config: &StoreConfig) -> usize {
        let radius = i32::try_from(config.load_radius).unwrap_or(i32::MAX / 2);
        let radius_sq = i64::from(radius) * i64::from(radius);

        let mut offsets: Vec<(i32, i32)> = Vec::new();
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                if i64::from(dx).pow(2) + i64::from(dz).pow(2) <= radius_sq {
                    offsets.push((dx, dz));
                }
            }
        }
        offsets.sort_by_key(|&(dx, dz)| i64::from(dx).pow(2) + i64::from(dz).pow(2));

        let mut created = 0;
        for (dx, dz) in offsets {
            let coord = center.offset_xz(dx, dz);
            let (_, is_new) = self.get_or_create_with(coord, config.save_directory.clone());
            if is_new {
                created += 1;
            }
        }
        created
    }

    fn evict_outside(&self, center: ChunkCoord, config: &StoreConfig) -> Vec<ChunkHandle> {
        let limit = i64::from(config.unload_radius).pow(2);

        let mut chunks = self.chunks.lock();
        let doomed: Vec<ChunkCoord> = chunks
            .keys()
            .filter(|coord| coord.distance_sq_xz(center) > limit)
            .copied()
            .collect();
        let evicted: Vec<ChunkHandle> = doomed
            .iter()
            .filter_map(|coord| chunks.remove(coord))
            .collect();
        drop(chunks);

        self.counters
            .evicted
            .fetch_add(evicted.len() as u64, Ordering::Relaxed);
        evicted
    }

    /// Best-effort save of an evicted chunk. Failures are logged.
    fn save_evicted(&self, handle: &ChunkHandle, dir: &Path) -> bool {
        match self.save_handle(handle, dir) {
            Ok(saved) => saved,
            Err(e) => {
                self.counters.save_failures.fetch_add(1, Ordering::Relaxed);
                warn!(coord = %handle.coord(), error = %e, "failed to save evicted chunk");
                false
            }
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Writes a resident chunk to `dir` and clears its dirty flag.
    ///
    /// Returns `Ok(false)` if the chunk is not resident or not generated
    /// yet (there is nothing meaningful to save).
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be written.
    pub fn save_chunk(&self, coord: ChunkCoord, dir: impl AsRef<Path>) -> WorldResult<bool> {
        match self.get_chunk(coord) {
            Some(handle) => self.save_handle(&handle, dir.as_ref()),
            None => Ok(false),
        }
    }

    fn save_handle(&self, handle: &ChunkHandle, dir: &Path) -> WorldResult<bool> {
        let (bytes, revision) = {
            let chunk = handle.read();
            if !chunk.is_generated() {
                return Ok(false);
            }
            (encode_blocks(chunk.blocks()), chunk.revision())
        };

        write_chunk_bytes(dir, handle.coord(), &bytes)?;
        handle.write().mark_saved(revision);
        self.counters.saved.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Saves every resident dirty chunk to the configured save directory.
    ///
    /// Returns the number of chunks written. Does nothing without a save
    /// directory. Failures are logged and counted, not returned.
    pub fn save_dirty(&self) -> usize {
        let Some(dir) = self.config.read().save_directory.clone() else {
            return 0;
        };

        let resident: Vec<ChunkHandle> = self.chunks.lock().values().cloned().collect();

        resident
            .iter()
            .filter(|handle| handle.read().is_dirty())
            .filter(|handle| self.save_evicted(handle, &dir))
            .count()
    }

    /// Loads a chunk from `dir`, replacing or creating the resident chunk.
    ///
    /// Returns false on a missing, unreadable or corrupt file; the store is
    /// then left as if the load had never been attempted.
    pub fn load_chunk(&self, coord: ChunkCoord, dir: impl AsRef<Path>) -> bool {
        match self.try_load_chunk(coord, dir) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(%coord, error = %e, "failed to load chunk");
                false
            }
        }
    }

    /// Like [`load_chunk`](Self::load_chunk), but reports why a load failed.
    ///
    /// A missing file is `Ok(false)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `Io` for read failures and `CorruptChunk` for bad contents.
    pub fn try_load_chunk(&self, coord: ChunkCoord, dir: impl AsRef<Path>) -> WorldResult<bool> {
        let Some(blocks) = read_chunk_file(dir.as_ref(), coord)? else {
            return Ok(false);
        };

        let handle = {
            let mut chunks = self.chunks.lock();
            chunks
                .entry(coord)
                .or_insert_with(|| ChunkHandle::new(Chunk::new(coord)))
                .clone()
        };
        handle.write().restore(blocks);
        self.counters.restored.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Returns a statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let (generated, failed) = {
            let pool = self.pool.lock();
            (pool.generation_passes(), pool.failed_jobs())
        };
        StoreStats {
            resident: self.resident_count(),
            pending_generation: self.pending.load(Ordering::Acquire),
            generated_this_session: generated,
            failed_generations: failed,
            restored_this_session: self.counters.restored.load(Ordering::Relaxed),
            evicted_this_session: self.counters.evicted.load(Ordering::Relaxed),
            saved_this_session: self.counters.saved.load(Ordering::Relaxed),
            save_failures: self.counters.save_failures.load(Ordering::Relaxed),
            simulated_seconds: *self.simulated_seconds.lock(),
        }
    }
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("generator", &self.generator)
            .field("config", &*self.config.read())
            .field("resident", &self.resident_count())
            .field("workers", &self.pool.lock().worker_count())
            .finish_non_exhaustive()
    }
}
