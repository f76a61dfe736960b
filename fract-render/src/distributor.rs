use std::sync::Arc;

use tracing::debug;

use crate::pool::WorkerPool;
use crate::tile::TileGrid;
use crate::worker::PassContext;

/// How a call to [`distribute`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every tile was handed to a worker. Some may still be computing.
    Completed,
    /// Cancellation stopped the pass; every worker has since returned to idle.
    Aborted,
}

/// Split the pass's target into tiles and hand them to idle workers.
///
/// Tiles go out in row-major order, one per idle worker, first-available
/// wins. `cancelled` is polled before each tile and whenever the distributor
/// is woken while waiting for a worker; once it reports true no further
/// tiles are generated and the pool is drained before returning
/// [`PassOutcome::Aborted`]. After an abort the caller may replace the
/// target buffer: no worker still references it.
pub fn distribute(
    pass: &Arc<PassContext>,
    pool: &WorkerPool,
    tile_size: u32,
    cancelled: &mut dyn FnMut() -> bool,
) -> PassOutcome {
    let buffer = pass.buffer();
    let grid = TileGrid::new(buffer.width(), buffer.height(), tile_size);
    let tile_count = grid.tile_count();
    debug!(
        pass = pass.id(),
        tile_count,
        width = buffer.width(),
        height = buffer.height(),
        "Distributing tiles"
    );

    for (assigned, tile) in grid.enumerate() {
        if cancelled() {
            return drain(pass, pool, assigned, tile_count);
        }
        let Some(worker) = pool.acquire_idle(cancelled) else {
            return drain(pass, pool, assigned, tile_count);
        };
        pool.assign(worker, tile, Arc::clone(pass));
    }

    PassOutcome::Completed
}

/// Distribute a pass with no cancellation and wait until every tile is
/// written.
pub fn render_to_completion(pass: &Arc<PassContext>, pool: &WorkerPool, tile_size: u32) -> PassOutcome {
    let outcome = distribute(pass, pool, tile_size, &mut || false);
    pool.wait_all_idle();
    outcome
}

fn drain(pass: &PassContext, pool: &WorkerPool, assigned: usize, tile_count: usize) -> PassOutcome {
    let abandoned = pool.abandon_in_flight();
    debug!(
        pass = pass.id(),
        assigned,
        tile_count,
        abandoned,
        "Pass cancelled, draining workers"
    );
    pool.wait_all_idle();
    PassOutcome::Aborted
}
