use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use rug::Float;
use tracing::{debug, info, warn};

use fract_core::{Viewport, ViewportStatus};

use crate::buffer::PixelBuffer;
use crate::distributor::{distribute, PassOutcome};
use crate::error::RenderError;
use crate::gradient::Gradient;
use crate::pool::{lock, PoolMonitor, TileAssignment, WorkerPool};
use crate::tile::TILE_SIZE;
use crate::worker::PassContext;

// ---------------------------------------------------------------------------
// Configuration & commands
// ---------------------------------------------------------------------------

/// Tunables for the render engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Worker count; `None` uses the hardware parallelism.
    pub worker_threads: Option<usize>,
    /// Tile edge in pixels.
    pub tile_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            tile_size: TILE_SIZE,
        }
    }
}

/// A request from the input side. Each accepted one counts as new input.
#[derive(Debug, Clone)]
pub enum Command {
    /// Move the centre by a complex-plane offset.
    Pan { re: Float, im: Float },
    /// Move the centre by a screen offset at the current scale.
    PanPixels { dx: f64, dy: f64 },
    /// Multiply the scale (> 1 zooms in).
    Zoom { factor: f64 },
    SetScale { value: Float },
    SetIterations { delta: i64 },
    SetPrecision { delta: i64 },
    /// Centre the view on a pixel of the current target.
    Recenter { x: i64, y: i64 },
    Resize { width: u32, height: u32 },
    Shutdown,
}

/// What the coordinator thread is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Waiting for a command after a completed pass.
    Idle,
    Resizing,
    Distributing,
    ShuttingDown,
}

/// Running totals of finished passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassCounters {
    pub completed: u64,
    pub aborted: u64,
}

// ---------------------------------------------------------------------------
// Published state
// ---------------------------------------------------------------------------

/// Everything the display side may read, refreshed by the coordinator.
#[derive(Debug)]
struct Published {
    frame: Arc<PixelBuffer>,
    status: ViewportStatus,
    state: CoordinatorState,
    last_error: Option<String>,
    passes: PassCounters,
}

type SharedPublished = Arc<Mutex<Published>>;

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// The display side's handle on a running render engine.
///
/// Sending never blocks on rendering. Dropping the handle shuts the engine
/// down and joins its threads.
#[derive(Debug)]
pub struct RenderHandle {
    tx: Sender<Command>,
    published: SharedPublished,
    monitor: PoolMonitor,
    thread: Option<JoinHandle<()>>,
}

impl RenderHandle {
    /// Start the worker pool and the coordinator thread.
    ///
    /// Fails if the initial buffer cannot be allocated or a thread cannot be
    /// spawned.
    pub fn spawn(
        config: RenderConfig,
        gradient: Arc<Gradient>,
        viewport: Viewport,
        width: u32,
        height: u32,
    ) -> crate::Result<Self> {
        let pool = WorkerPool::new(config.worker_threads.unwrap_or_else(WorkerPool::default_size))?;
        let monitor = pool.monitor();
        let frame = Arc::new(PixelBuffer::new(width, height)?);

        let published = Arc::new(Mutex::new(Published {
            frame: Arc::clone(&frame),
            status: viewport.status(),
            state: CoordinatorState::Distributing,
            last_error: None,
            passes: PassCounters::default(),
        }));

        let (tx, rx) = mpsc::channel();
        let coordinator = Coordinator {
            pool,
            gradient,
            target: frame,
            tile_size: config.tile_size.max(1),
            next_pass: 0,
            controls: Controls {
                rx,
                viewport,
                target_size: (width, height),
                pending_size: (width, height),
                new_input: false,
                shutdown: false,
                published: Arc::clone(&published),
            },
        };

        let thread = std::thread::Builder::new()
            .name("render-coordinator".into())
            .spawn(move || coordinator.run())
            .map_err(|source| RenderError::ThreadSpawn {
                name: "render-coordinator".into(),
                source,
            })?;

        Ok(Self {
            tx,
            published,
            monitor,
            thread: Some(thread),
        })
    }

    /// Queue a command and wake the coordinator.
    pub fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            debug!("Render coordinator has exited; command dropped");
            return;
        }
        self.monitor.notify();
    }

    /// The buffer the display should present. It may be mid-pass.
    pub fn frame(&self) -> Arc<PixelBuffer> {
        Arc::clone(&lock(&self.published).frame)
    }

    /// Current viewport readout.
    pub fn status(&self) -> ViewportStatus {
        lock(&self.published).status.clone()
    }

    pub fn state(&self) -> CoordinatorState {
        lock(&self.published).state
    }

    /// The most recent recoverable error, e.g. a refused resize.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.published).last_error.clone()
    }

    pub fn passes(&self) -> PassCounters {
        lock(&self.published).passes
    }

    /// Tiles currently in flight, for a debug overlay.
    pub fn assignments(&self) -> Vec<TileAssignment> {
        self.monitor.assignments()
    }

    pub fn idle_workers(&self) -> usize {
        self.monitor.idle_count()
    }

    pub fn pool_size(&self) -> usize {
        self.monitor.size()
    }

    /// Request shutdown and wait for every render thread to exit. Later
    /// calls are no-ops.
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.send(Command::Shutdown);
            if thread.join().is_err() {
                warn!("Render coordinator panicked");
            }
        }
    }
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ---------------------------------------------------------------------------
// Coordinator thread
// ---------------------------------------------------------------------------

/// Input-side state owned by the coordinator thread.
///
/// Split from [`Coordinator`] so the distributor's cancellation callback can
/// apply commands while the pool is borrowed.
struct Controls {
    rx: Receiver<Command>,
    viewport: Viewport,
    target_size: (u32, u32),
    pending_size: (u32, u32),
    new_input: bool,
    shutdown: bool,
    published: SharedPublished,
}

impl Controls {
    /// Apply every queued command without blocking. Returns whether the
    /// running pass must be cancelled.
    fn poll(&mut self) -> bool {
        let mut accepted = false;
        loop {
            match self.rx.try_recv() {
                Ok(command) => accepted |= self.apply(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.shutdown = true;
                    break;
                }
            }
        }
        if accepted {
            self.publish_status();
        }
        self.cancel_pending()
    }

    /// Block until a command that needs a new pass arrives, or shutdown.
    /// Rejected commands keep waiting.
    fn wait_for_command(&mut self) {
        while !self.new_input && !self.cancel_pending() {
            match self.rx.recv() {
                Ok(command) => {
                    if self.apply(command) {
                        self.publish_status();
                    }
                    self.poll();
                }
                Err(_) => self.shutdown = true,
            }
        }
    }

    fn cancel_pending(&self) -> bool {
        self.shutdown || self.pending_size != self.target_size
    }

    /// Apply one command. Returns false if it was rejected.
    fn apply(&mut self, command: Command) -> bool {
        debug!(?command, "Applying command");
        let result = match command {
            Command::Pan { re, im } => {
                self.viewport.pan(&re, &im);
                Ok(())
            }
            Command::PanPixels { dx, dy } => {
                self.viewport.pan_pixels(dx, dy);
                Ok(())
            }
            Command::Zoom { factor } => self.viewport.zoom(factor),
            Command::SetScale { value } => self.viewport.set_scale(value),
            Command::SetIterations { delta } => {
                self.viewport.adjust_iterations(delta);
                Ok(())
            }
            Command::SetPrecision { delta } => {
                self.viewport.adjust_precision(delta);
                Ok(())
            }
            Command::Recenter { x, y } => {
                let (width, height) = self.pending_size;
                self.viewport.recenter(x, y, width, height);
                Ok(())
            }
            Command::Resize { width, height } => {
                self.pending_size = (width, height);
                Ok(())
            }
            Command::Shutdown => {
                self.shutdown = true;
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("Ignoring command: {e}");
            return false;
        }
        self.new_input = true;
        true
    }

    fn publish_status(&self) {
        let status = self.viewport.status();
        lock(&self.published).status = status;
    }

    fn set_state(&self, state: CoordinatorState) {
        lock(&self.published).state = state;
    }
}

struct Coordinator {
    pool: WorkerPool,
    gradient: Arc<Gradient>,
    target: Arc<PixelBuffer>,
    tile_size: u32,
    next_pass: u64,
    controls: Controls,
}

impl Coordinator {
    fn run(mut self) {
        info!(workers = self.pool.size(), "Render coordinator started");

        loop {
            self.controls.poll();
            if self.controls.shutdown {
                break;
            }
            if self.controls.pending_size != self.controls.target_size {
                self.resize();
            }

            self.controls.new_input = false;
            self.controls.set_state(CoordinatorState::Distributing);
            let pass = Arc::new(PassContext::new(
                self.next_pass,
                self.controls.viewport.clone(),
                Arc::clone(&self.gradient),
                Arc::clone(&self.target),
            ));
            self.next_pass += 1;

            let start = Instant::now();
            let controls = &mut self.controls;
            let outcome = distribute(&pass, &self.pool, self.tile_size, &mut || controls.poll());

            match outcome {
                PassOutcome::Aborted => {
                    lock(&self.controls.published).passes.aborted += 1;
                    info!(
                        pass = pass.id(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Pass aborted"
                    );
                }
                PassOutcome::Completed => {
                    lock(&self.controls.published).passes.completed += 1;
                    info!(
                        pass = pass.id(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        iterations = pass.viewport().max_iterations(),
                        precision = pass.viewport().precision(),
                        "All tiles assigned"
                    );
                    if !self.controls.new_input && !self.controls.cancel_pending() {
                        self.controls.set_state(CoordinatorState::Idle);
                        self.controls.wait_for_command();
                    }
                }
            }
        }

        self.controls.set_state(CoordinatorState::ShuttingDown);
        self.pool.shutdown_all();
        info!("Render coordinator stopped");
    }

    /// Drain the pool, then swap in a buffer of the pending size.
    ///
    /// On allocation failure the previous buffer stays current and the error
    /// is published.
    fn resize(&mut self) {
        self.controls.set_state(CoordinatorState::Resizing);
        self.pool.abandon_in_flight();
        self.pool.wait_all_idle();

        let (width, height) = self.controls.pending_size;
        match PixelBuffer::new(width, height) {
            Ok(buffer) => {
                self.target = Arc::new(buffer);
                self.controls.target_size = (width, height);
                let mut published = lock(&self.controls.published);
                published.frame = Arc::clone(&self.target);
                published.last_error = None;
                drop(published);
                info!(width, height, "Render target resized");
            }
            Err(e) => {
                warn!(width, height, "Keeping previous render target: {e}");
                self.controls.pending_size = self.controls.target_size;
                lock(&self.controls.published).last_error = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fract_core::FractalParams;

    fn fresh_controls() -> (Sender<Command>, Controls) {
        let (tx, rx) = mpsc::channel();
        let viewport = Viewport::initial(FractalParams::default());
        let frame = Arc::new(PixelBuffer::new(10, 10).unwrap());
        let published = Arc::new(Mutex::new(Published {
            frame,
            status: viewport.status(),
            state: CoordinatorState::Idle,
            last_error: None,
            passes: PassCounters::default(),
        }));
        let controls = Controls {
            rx,
            viewport,
            target_size: (10, 10),
            pending_size: (10, 10),
            new_input: false,
            shutdown: false,
            published,
        };
        (tx, controls)
    }

    #[test]
    fn viewport_commands_do_not_cancel() {
        let (tx, mut controls) = fresh_controls();
        tx.send(Command::Zoom { factor: 2.0 }).unwrap();
        tx.send(Command::SetIterations { delta: 5 }).unwrap();
        assert!(!controls.poll());
        assert!(controls.new_input);
        assert_eq!(*controls.viewport.scale(), 200);
        assert_eq!(lock(&controls.published).status.iterations, 15);
    }

    #[test]
    fn resize_and_shutdown_cancel() {
        let (tx, mut controls) = fresh_controls();
        tx.send(Command::Resize { width: 20, height: 10 }).unwrap();
        assert!(controls.poll());

        let (tx, mut controls) = fresh_controls();
        tx.send(Command::Shutdown).unwrap();
        assert!(controls.poll());
        assert!(controls.shutdown);
    }

    #[test]
    fn resize_to_same_size_does_not_cancel() {
        let (tx, mut controls) = fresh_controls();
        tx.send(Command::Resize { width: 10, height: 10 }).unwrap();
        assert!(!controls.poll());
    }

    #[test]
    fn dropped_sender_means_shutdown() {
        let (tx, mut controls) = fresh_controls();
        drop(tx);
        assert!(controls.poll());
        assert!(controls.shutdown);
    }

    #[test]
    fn invalid_command_is_not_new_input() {
        let (tx, mut controls) = fresh_controls();
        tx.send(Command::Zoom { factor: -1.0 }).unwrap();
        controls.poll();
        assert!(!controls.new_input);
        assert_eq!(*controls.viewport.scale(), 100);
    }

    #[test]
    fn rejected_command_keeps_waiting() {
        let (tx, mut controls) = fresh_controls();
        tx.send(Command::Zoom { factor: -1.0 }).unwrap();
        tx.send(Command::SetScale { value: Float::with_val(64, 0) }).unwrap();
        tx.send(Command::SetIterations { delta: 1 }).unwrap();
        controls.wait_for_command();
        assert!(controls.new_input);
        assert!(matches!(controls.rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(lock(&controls.published).status.iterations, 11);
    }

    #[test]
    fn wait_returns_on_disconnect() {
        let (tx, mut controls) = fresh_controls();
        tx.send(Command::Zoom { factor: f64::NAN }).unwrap();
        drop(tx);
        controls.wait_for_command();
        assert!(controls.shutdown);
        assert!(!controls.new_input);
    }

    #[test]
    fn recenter_uses_pending_size() {
        let (tx, mut controls) = fresh_controls();
        tx.send(Command::Resize { width: 200, height: 100 }).unwrap();
        tx.send(Command::Recenter { x: 150, y: 50 }).unwrap();
        controls.poll();
        assert_eq!(controls.viewport.center().to_f64(), (0.5, 0.0));
    }
}
