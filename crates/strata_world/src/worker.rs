//! # Generation Workers
//!
//! A pool of threads that turn queued chunk coordinates into block arrays.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  jobs   ┌──────────────┐ results ┌──────────────┐
//! │  ChunkStore  │ ──────▶ │   Workers    │ ──────▶ │  ChunkStore  │
//! │ (create+send │ (FIFO)  │ (restore or  │         │  (install)   │
//! │  under lock) │         │  generate)   │         │              │
//! └──────────────┘         └──────────────┘         └──────────────┘
//! ```
//!
//! Workers block on the job channel; there is no sleep-polling. A worker
//! never touches the coordinate map: it holds only a weak reference to the
//! chunk it was asked to fill, and sends the finished blocks back to the
//! store, which installs them if the chunk is still resident.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use strata_terrain::{Block, TerrainGenerator};
use tracing::{debug, error, info, trace, warn};

use crate::chunk::Chunk;
use crate::coords::{ChunkCoord, BLOCKS_PER_CHUNK, CHUNK_EXTENTS};
use crate::persistence::read_chunk_file;

/// A request to fill one chunk.
pub(crate) struct GenerationJob {
    pub coord: ChunkCoord,
    /// Weak so an evicted chunk is freed even while its job is queued.
    pub target: Weak<RwLock<Chunk>>,
    /// Save directory to try before generating.
    pub restore_from: Option<PathBuf>,
}

enum WorkerMessage {
    Generate(GenerationJob),
    /// Ends the receiving worker (pool shrink or shutdown).
    Retire,
}

/// Where installed blocks came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockSource {
    Generated,
    Restored,
}

/// Outcome of one job, sent back to the store.
pub(crate) enum GenerationResult {
    Completed {
        coord: ChunkCoord,
        target: Weak<RwLock<Chunk>>,
        blocks: Box<[Block]>,
        source: BlockSource,
    },
    /// The chunk was evicted or already filled before the worker reached it.
    Skipped { coord: ChunkCoord },
}

/// State shared by every worker.
struct WorkerShared {
    generator: Arc<TerrainGenerator>,
    shutdown: AtomicBool,
    /// Instrumented count of terrain synthesis passes.
    generation_passes: AtomicU64,
    /// Jobs that panicked and were answered with `Skipped`.
    failed_jobs: AtomicU64,
}

/// Fixed-size (resizable between updates) pool of generation threads.
pub(crate) struct GenerationPool {
    job_tx: Sender<WorkerMessage>,
    job_rx: Receiver<WorkerMessage>,
    result_tx: Sender<GenerationResult>,
    shared: Arc<WorkerShared>,
    workers: Vec<JoinHandle<()>>,
    /// Workers not yet told to retire.
    active: usize,
    next_id: usize,
}

impl GenerationPool {
    /// Starts `worker_count` workers.
    pub fn new(
        generator: Arc<TerrainGenerator>,
        worker_count: usize,
        result_tx: Sender<GenerationResult>,
    ) -> Self {
        let (job_tx, job_rx) = unbounded();
        let mut pool = Self {
            job_tx,
            job_rx,
            result_tx,
            shared: Arc::new(WorkerShared {
                generator,
                shutdown: AtomicBool::new(false),
                generation_passes: AtomicU64::new(0),
                failed_jobs: AtomicU64::new(0),
            }),
            workers: Vec::with_capacity(worker_count),
            active: 0,
            next_id: 0,
        };
        pool.resize(worker_count);
        pool
    }

    /// Queues a job. Never blocks.
    pub fn submit(&self, job: GenerationJob) {
        // The pool owns a receiver, so the channel cannot be disconnected
        if self.job_tx.send(WorkerMessage::Generate(job)).is_err() {
            warn!("generation queue closed, job dropped");
        }
    }

    /// Number of terrain synthesis passes so far.
    pub fn generation_passes(&self) -> u64 {
        self.shared.generation_passes.load(Ordering::Relaxed)
    }

    /// Number of jobs that panicked.
    pub fn failed_jobs(&self) -> u64 {
        self.shared.failed_jobs.load(Ordering::Relaxed)
    }

    /// Number of workers currently serving the queue.
    pub fn worker_count(&self) -> usize {
        self.active
    }

    /// Grows or shrinks the pool to `target` workers.
    ///
    /// Retiring workers finish the job in hand first.
    pub fn resize(&mut self, target: usize) {
        self.workers.retain(|handle| !handle.is_finished());

        if target == self.active {
            return;
        }
        if self.active != 0 {
            info!(from = self.active, to = target, "resizing generation pool");
        }

        while self.active < target {
            match self.spawn_worker() {
                Ok(handle) => {
                    self.workers.push(handle);
                    self.active += 1;
                }
                Err(e) => {
                    warn!(error = %e, "failed to spawn generation worker");
                    break;
                }
            }
        }
        while self.active > target {
            if self.job_tx.send(WorkerMessage::Retire).is_err() {
                break;
            }
            self.active -= 1;
        }
    }

    fn spawn_worker(&mut self) -> std::io::Result<JoinHandle<()>> {
        let id = self.next_id;
        self.next_id += 1;

        let jobs = self.job_rx.clone();
        let results = self.result_tx.clone();
        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name(format!("strata-gen-{id}"))
            .spawn(move || run_worker(id, &jobs, &results, &shared))
    }
}

impl Drop for GenerationPool {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        // One retire per live thread, including ones already retiring
        for _ in 0..self.workers.len() {
            let _ = self.job_tx.send(WorkerMessage::Retire);
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("generation worker panicked");
            }
        }
        debug!("generation pool stopped");
    }
}

fn run_worker(
    id: usize,
    jobs: &Receiver<WorkerMessage>,
    results: &Sender<GenerationResult>,
    shared: &WorkerShared,
) {
    debug!(worker = id, "generation worker started");

    while let Ok(message) = jobs.recv() {
        let job = match message {
            WorkerMessage::Generate(job) => job,
            WorkerMessage::Retire => break,
        };

        let result = if shared.shutdown.load(Ordering::Acquire) {
            GenerationResult::Skipped { coord: job.coord }
        } else {
            let coord = job.coord;
            answer(id, coord, shared, || process_job(job, shared))
        };

        if results.send(result).is_err() {
            // Store is gone
            break;
        }
    }

    debug!(worker = id, "generation worker stopped");
}

/// Runs one job, turning a panic into `Skipped`.
///
/// Every job must be answered: the store counts jobs in flight and waits
/// for each of them.
fn answer(
    id: usize,
    coord: ChunkCoord,
    shared: &WorkerShared,
    work: impl FnOnce() -> GenerationResult,
) -> GenerationResult {
    panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|_| {
        shared.failed_jobs.fetch_add(1, Ordering::Relaxed);
        error!(worker = id, %coord, "generation job panicked");
        GenerationResult::Skipped { coord }
    })
}

fn process_job(job: GenerationJob, shared: &WorkerShared) -> GenerationResult {
    let GenerationJob {
        coord,
        target,
        restore_from,
    } = job;

    // Re-check under the chunk's own lock; the map lock is never taken here
    let still_wanted = target
        .upgrade()
        .is_some_and(|chunk| !chunk.read().is_generated());
    if !still_wanted {
        trace!(%coord, "skipping stale generation job");
        return GenerationResult::Skipped { coord };
    }

    if let Some(dir) = restore_from {
        match read_chunk_file(&dir, coord) {
            Ok(Some(blocks)) => {
                return GenerationResult::Completed {
                    coord,
                    target,
                    blocks,
                    source: BlockSource::Restored,
                };
            }
            Ok(None) => {}
            Err(e) => warn!(%coord, error = %e, "unreadable chunk file, regenerating"),
        }
    }

    let mut blocks = vec![Block::AIR; BLOCKS_PER_CHUNK].into_boxed_slice();
    match coord.checked_origin() {
        Some(origin) => {
            shared.generator.fill_chunk_blocks(
                [origin.x, origin.y, origin.z],
                CHUNK_EXTENTS,
                &mut blocks,
            );
            shared.generation_passes.fetch_add(1, Ordering::Relaxed);
        }
        None => debug!(%coord, "chunk outside the addressable world, left as air"),
    }

    GenerationResult::Completed {
        coord,
        target,
        blocks,
        source: BlockSource::Generated,
    }
}
