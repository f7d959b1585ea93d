//! Worker identity types.

use crate::error::{AbacusError, Result};
use serde::{Deserialize, Serialize};

/// Unique identifier for a worker, in `[0, workers)`.
pub type WorkerId = usize;

/// The designated worker that receives the reduced result and produces
/// output.
pub const COORDINATOR: WorkerId = 0;

/// Immutable per-run identity of one worker.
///
/// Every worker in a run holds the same `workers` and `n`; only `id`
/// differs. Built once after the table size broadcast and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerContext {
    /// This worker's id.
    pub id: WorkerId,
    /// Total number of workers in the pool.
    pub workers: usize,
    /// Table size: the run counts distinct values of i*j for 1 <= i, j <= n.
    pub n: u32,
}

impl WorkerContext {
    /// Create a validated worker context.
    pub fn new(id: WorkerId, workers: usize, n: u32) -> Result<Self> {
        if workers == 0 {
            return Err(AbacusError::Usage(
                "worker count must be at least 1".into(),
            ));
        }
        if id >= workers {
            return Err(AbacusError::Usage(format!(
                "worker id {id} is out of range for a pool of {workers}"
            )));
        }
        Ok(Self { id, workers, n })
    }

    /// Whether this worker is the coordinator.
    #[must_use]
    pub fn is_coordinator(&self) -> bool {
        self.id == COORDINATOR
    }
}
