//! The per-worker pipeline.
//!
//! Phases run in a fixed order and every collective is called exactly once
//! per run: broadcast(N), partition, route, exchange counts, exchange
//! payload, deduplicate, reduce. A worker with an empty row range still
//! walks the whole sequence; it simply contributes zero candidates.

use crate::comm::Collective;
use crate::dedup::ValueSet;
use crate::exchange::exchange;
use crate::partition::partition_rows;
use crate::router::{route_products, Traversal};
use abacus_core::{AbacusError, Result, WorkerContext, COORDINATOR};

/// Run one worker through a full counting run.
///
/// `n` is this worker's copy of the table size; the value actually used is
/// the coordinator's, delivered by the opening broadcast. Returns
/// `Some(total)` at the coordinator and `None` everywhere else.
pub fn run_worker<C: Collective>(
    comm: &mut C,
    n: u32,
    traversal: Traversal,
) -> Result<Option<u64>> {
    let n = comm.broadcast(u64::from(n), COORDINATOR)?;
    let n = u32::try_from(n).map_err(|_| {
        AbacusError::Collective(format!("broadcast carried an out-of-range table size {n}"))
    })?;
    let ctx = WorkerContext::new(comm.id(), comm.workers(), n)?;

    let range = partition_rows(&ctx);
    let outgoing = route_products(&ctx, &range, traversal);
    let (received, _plan) = exchange(comm, outgoing)?;

    let mut set = ValueSet::with_expected(received.len());
    for value in received {
        set.insert(value);
    }

    comm.reduce_sum(set.len() as u64, COORDINATOR)
}
