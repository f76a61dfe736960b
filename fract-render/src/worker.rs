use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use fract_core::{Mandelbrot, Viewport};

use crate::buffer::PixelBuffer;
use crate::gradient::Gradient;
use crate::pool::{lock, wait, PoolShared};
use crate::tile::Tile;

/// Stable identity of a worker within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Lifecycle of a worker thread.
///
/// `Idle → Assigned → Computing → Idle` repeats until a shutdown signal is
/// observed in `Idle`, which leads to `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Assigned,
    Computing,
    Terminated,
}

impl WorkerState {
    /// Whether the worker currently owns a tile.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Assigned | Self::Computing)
    }
}

/// Per-pass counters, bumped once per finished tile.
#[derive(Debug, Default)]
pub struct PassStats {
    tiles_completed: AtomicUsize,
    pixels_written: AtomicU64,
}

impl PassStats {
    pub fn tiles_completed(&self) -> usize {
        self.tiles_completed.load(Ordering::Relaxed)
    }

    pub fn pixels_written(&self) -> u64 {
        self.pixels_written.load(Ordering::Relaxed)
    }
}

/// Everything a worker needs to compute tiles of one pass.
///
/// The viewport is a private snapshot, so input arriving mid-pass never
/// changes what the pass computes.
#[derive(Debug)]
pub struct PassContext {
    id: u64,
    viewport: Viewport,
    mandelbrot: Mandelbrot,
    gradient: Arc<Gradient>,
    buffer: Arc<PixelBuffer>,
    stats: PassStats,
}

impl PassContext {
    pub fn new(id: u64, viewport: Viewport, gradient: Arc<Gradient>, buffer: Arc<PixelBuffer>) -> Self {
        let mandelbrot = Mandelbrot::new(*viewport.params());
        Self {
            id,
            viewport,
            mandelbrot,
            gradient,
            buffer,
            stats: PassStats::default(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn buffer(&self) -> &Arc<PixelBuffer> {
        &self.buffer
    }

    pub fn stats(&self) -> &PassStats {
        &self.stats
    }

    /// Compute every pixel of `tile` and store it straight into the shared
    /// buffer.
    pub fn render_tile(&self, tile: &Tile) {
        debug_assert!(self.buffer.contains(tile), "tile {tile:?} outside target");
        let (width, height) = (self.buffer.width(), self.buffer.height());
        for py in tile.y..tile.y + tile.height {
            for px in tile.x..tile.x + tile.width {
                let c = self.viewport.pixel_to_complex(px as i64, py as i64, width, height);
                let v = self.mandelbrot.evaluate(&c);
                self.buffer.store(px, py, self.gradient.color_of(v));
            }
        }
        self.stats.tiles_completed.fetch_add(1, Ordering::Relaxed);
        self.stats
            .pixels_written
            .fetch_add(tile.pixel_count() as u64, Ordering::Relaxed);
    }
}

/// A tile handed to one worker.
#[derive(Debug)]
pub(crate) struct TileJob {
    pub(crate) tile: Tile,
    pub(crate) pass: Arc<PassContext>,
}

/// Body of a worker thread.
pub(crate) fn run(id: WorkerId, shared: Arc<PoolShared>) {
    let handle = &shared.workers[id.0];
    debug!(%id, "Worker started");

    loop {
        {
            let mut slot = lock(&handle.slot);
            slot.state = WorkerState::Idle;
            slot.tile = None;
            slot.abandoned = false;
        }
        shared.announce_idle(id);

        let job = {
            let mut slot = lock(&handle.slot);
            while slot.job.is_none() && !slot.shutdown {
                slot = wait(&handle.wake, slot);
            }
            if slot.shutdown {
                slot.state = WorkerState::Terminated;
                slot.job = None;
                slot.tile = None;
                drop(slot);
                shared.announce();
                debug!(%id, "Worker terminated");
                return;
            }
            slot.state = WorkerState::Computing;
            slot.job.take()
        };

        if let Some(job) = job {
            trace!(%id, pass = job.pass.id(), x = job.tile.x, y = job.tile.y, "Computing tile");
            job.pass.render_tile(&job.tile);
        }
    }
}
