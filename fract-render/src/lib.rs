pub mod buffer;
pub mod coordinator;
pub mod distributor;
pub mod error;
pub mod gradient;
pub mod pool;
pub mod tile;
pub mod worker;

pub use buffer::PixelBuffer;
pub use coordinator::{Command, CoordinatorState, PassCounters, RenderConfig, RenderHandle};
pub use distributor::{distribute, render_to_completion, PassOutcome};
pub use error::RenderError;
pub use gradient::{color_of, Gradient};
pub use pool::{IdleWorker, PoolMonitor, TileAssignment, WorkerPool};
pub use tile::{build_tile_grid, Tile, TileGrid, TILE_SIZE};
pub use worker::{PassContext, PassStats, WorkerId, WorkerState};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
