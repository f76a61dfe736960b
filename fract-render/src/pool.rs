use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use tracing::{debug, error, info};

use crate::error::RenderError;
use crate::tile::Tile;
use crate::worker::{self, PassContext, TileJob, WorkerId, WorkerState};

/// Upper bound on the number of worker threads.
pub const MAX_WORKERS: usize = 64;

// ---------------------------------------------------------------------------
// Lock helpers
// ---------------------------------------------------------------------------

// Workers never panic while holding a pool lock, so a poisoned mutex still
// guards consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn wait<'a, T>(condvar: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
    condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// A worker's mailbox and visible state, guarded by its private lock.
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) state: WorkerState,
    pub(crate) job: Option<TileJob>,
    pub(crate) tile: Option<Tile>,
    pub(crate) abandoned: bool,
    pub(crate) shutdown: bool,
}

/// The private synchronization handle of one worker.
#[derive(Debug)]
pub(crate) struct WorkerHandle {
    pub(crate) slot: Mutex<Slot>,
    pub(crate) wake: Condvar,
}

#[derive(Debug)]
struct FreeList {
    idle: VecDeque<WorkerId>,
    shutdown: bool,
}

#[derive(Debug)]
pub(crate) struct PoolShared {
    free: Mutex<FreeList>,
    available: Condvar,
    pub(crate) workers: Vec<WorkerHandle>,
}

impl PoolShared {
    fn new(size: usize) -> Self {
        let workers = (0..size)
            .map(|_| WorkerHandle {
                slot: Mutex::new(Slot {
                    state: WorkerState::Idle,
                    job: None,
                    tile: None,
                    abandoned: false,
                    shutdown: false,
                }),
                wake: Condvar::new(),
            })
            .collect();
        Self {
            free: Mutex::new(FreeList {
                idle: VecDeque::with_capacity(size),
                shutdown: false,
            }),
            available: Condvar::new(),
            workers,
        }
    }

    /// Put `id` on the free list and wake everyone waiting for a worker.
    pub(crate) fn announce_idle(&self, id: WorkerId) {
        let mut free = lock(&self.free);
        debug_assert!(!free.idle.contains(&id), "{id} is already idle");
        free.idle.push_back(id);
        self.available.notify_all();
    }

    /// Wake everyone waiting on the free list without changing it.
    pub(crate) fn announce(&self) {
        let _free = lock(&self.free);
        self.available.notify_all();
    }

    fn idle_count(&self) -> usize {
        lock(&self.free).idle.len()
    }

    fn assignments(&self) -> Vec<TileAssignment> {
        self.workers
            .iter()
            .enumerate()
            .filter_map(|(i, handle)| {
                let slot = lock(&handle.slot);
                match (slot.state.is_busy(), slot.tile) {
                    (true, Some(tile)) => Some(TileAssignment {
                        worker: WorkerId(i),
                        tile,
                        abandoned: slot.abandoned,
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    fn signal_shutdown(&self) {
        {
            let mut free = lock(&self.free);
            free.shutdown = true;
            self.available.notify_all();
        }
        for handle in &self.workers {
            let mut slot = lock(&handle.slot);
            slot.shutdown = true;
            handle.wake.notify_one();
        }
    }
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One entry of the in-flight tile list, for a diagnostics overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileAssignment {
    pub worker: WorkerId,
    pub tile: Tile,
    /// Set when a drain decided this tile's output is no longer needed.
    pub abandoned: bool,
}

/// Proof that a worker was taken off the free list.
///
/// Only [`WorkerPool::acquire_idle`] creates one and [`WorkerPool::assign`]
/// consumes it, so a worker can never be handed two tiles at once.
#[derive(Debug)]
#[must_use = "an acquired worker stays off the free list until it is assigned"]
pub struct IdleWorker {
    id: WorkerId,
}

impl IdleWorker {
    pub fn id(&self) -> WorkerId {
        self.id
    }
}

/// Read-only view of a pool that other threads can hold.
#[derive(Debug, Clone)]
pub struct PoolMonitor {
    shared: Arc<PoolShared>,
}

impl PoolMonitor {
    pub fn size(&self) -> usize {
        self.shared.workers.len()
    }

    pub fn idle_count(&self) -> usize {
        self.shared.idle_count()
    }

    pub fn assignments(&self) -> Vec<TileAssignment> {
        self.shared.assignments()
    }

    /// Wake a thread blocked in [`WorkerPool::acquire_idle`] so it re-checks
    /// its cancellation predicate.
    pub fn notify(&self) {
        self.shared.announce();
    }
}

// ---------------------------------------------------------------------------
// WorkerPool
// ---------------------------------------------------------------------------

/// A fixed set of worker threads plus the free list of idle ones.
#[derive(Debug)]
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    threads: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Hardware parallelism capped at [`MAX_WORKERS`].
    pub fn default_size() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(MAX_WORKERS)
    }

    /// Spawn `size` workers, clamped to `1..=MAX_WORKERS`.
    pub fn new(size: usize) -> crate::Result<Self> {
        let size = size.clamp(1, MAX_WORKERS);
        let shared = Arc::new(PoolShared::new(size));
        let mut threads = Vec::with_capacity(size);

        for i in 0..size {
            let id = WorkerId(i);
            let worker_shared = Arc::clone(&shared);
            let spawned = std::thread::Builder::new()
                .name(format!("render-{id}"))
                .spawn(move || worker::run(id, worker_shared));
            match spawned {
                Ok(handle) => threads.push(handle),
                Err(source) => {
                    error!(%id, "Failed to spawn worker: {source}");
                    shared.signal_shutdown();
                    for handle in threads {
                        let _ = handle.join();
                    }
                    return Err(RenderError::ThreadSpawn {
                        name: id.to_string(),
                        source,
                    });
                }
            }
        }

        info!(size, "Worker pool started");
        Ok(Self { shared, threads })
    }

    /// Number of workers in the pool.
    pub fn size(&self) -> usize {
        self.shared.workers.len()
    }

    /// Number of workers currently on the free list.
    pub fn idle_count(&self) -> usize {
        self.shared.idle_count()
    }

    /// Tiles currently held by workers.
    pub fn assignments(&self) -> Vec<TileAssignment> {
        self.shared.assignments()
    }

    pub fn monitor(&self) -> PoolMonitor {
        PoolMonitor {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Block until a worker is idle and take it off the free list.
    ///
    /// Returns `None` as soon as `cancelled` reports true or the pool is shut
    /// down. `cancelled` is evaluated with the free list locked, before every
    /// attempt and after every wake-up; it must not call back into this pool's
    /// idle accounting. Any thread that makes `cancelled` flip should call
    /// [`PoolMonitor::notify`] afterwards.
    pub fn acquire_idle(&self, cancelled: &mut dyn FnMut() -> bool) -> Option<IdleWorker> {
        let mut free = lock(&self.shared.free);
        loop {
            if free.shutdown || cancelled() {
                return None;
            }
            if let Some(id) = free.idle.pop_front() {
                return Some(IdleWorker { id });
            }
            free = wait(&self.shared.available, free);
        }
    }

    /// Hand `tile` of `pass` to an acquired worker and wake it.
    pub fn assign(&self, worker: IdleWorker, tile: Tile, pass: Arc<PassContext>) {
        let handle = &self.shared.workers[worker.id.0];
        let mut slot = lock(&handle.slot);
        debug_assert!(slot.job.is_none(), "{} already has a job", worker.id);
        slot.state = WorkerState::Assigned;
        slot.tile = Some(tile);
        slot.abandoned = false;
        slot.job = Some(TileJob { tile, pass });
        handle.wake.notify_one();
    }

    /// Mark every in-flight tile as abandoned. Returns how many were marked.
    pub fn abandon_in_flight(&self) -> usize {
        let mut count = 0;
        for handle in &self.shared.workers {
            let mut slot = lock(&handle.slot);
            if slot.state.is_busy() {
                slot.abandoned = true;
                count += 1;
            }
        }
        count
    }

    /// Block until every worker is back on the free list.
    pub fn wait_all_idle(&self) {
        let size = self.size();
        let mut free = lock(&self.shared.free);
        while free.idle.len() < size && !free.shutdown {
            free = wait(&self.shared.available, free);
        }
    }

    /// Signal every worker to stop and join each thread.
    ///
    /// Workers finish their current tile first. Calling this twice is a no-op.
    pub fn shutdown_all(&mut self) {
        if self.threads.is_empty() {
            return;
        }
        debug!(size = self.size(), "Shutting down worker pool");
        self.shared.signal_shutdown();
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("A render worker panicked");
            }
        }
        info!("Worker pool shut down");
    }

    /// Current state of each worker, indexed by id.
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.shared
            .workers
            .iter()
            .map(|handle| lock(&handle.slot).state)
            .collect()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown_all();
    }
}
