//! Driver for a full counting run.
//!
//! Spawns the worker pool, runs every worker through the pipeline, and
//! reports the coordinator's total. Any worker failure fails the whole
//! run; a partial pool cannot produce a meaningful count.

use crate::comm::LocalGroup;
use crate::router::Traversal;
use crate::worker::run_worker;
use abacus_core::{AbacusError, Result};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Instant;

/// Configuration for one counting run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CountConfig {
    /// Table size: count distinct values of i*j for 1 <= i, j <= n.
    pub n: u32,
    /// Number of workers in the pool.
    pub workers: usize,
    /// Column generation strategy.
    pub traversal: Traversal,
}

impl CountConfig {
    /// Create a config with the default triangular traversal.
    #[must_use]
    pub fn new(n: u32, workers: usize) -> Self {
        Self {
            n,
            workers,
            traversal: Traversal::default(),
        }
    }

    /// Set the traversal strategy.
    #[must_use]
    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }
}

/// Result of one counting run, produced at the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountReport {
    /// Table size counted.
    pub n: u32,
    /// Workers that participated.
    pub workers: usize,
    /// Number of distinct products in the n x n table.
    pub distinct: u64,
    /// Wall time of the run in seconds.
    pub elapsed_secs: f64,
}

/// Count the distinct products of the n x n multiplication table.
///
/// Runs one thread per worker; every worker owns its buffers and its
/// partition exclusively and meets the others only at collective phase
/// boundaries. The first worker error aborts the run.
pub fn count_distinct(config: &CountConfig) -> Result<CountReport> {
    if config.workers == 0 {
        return Err(AbacusError::Usage(
            "worker count must be at least 1".into(),
        ));
    }

    let start = Instant::now();
    let endpoints = LocalGroup::connect(config.workers)?.into_endpoints();
    let n = config.n;
    let traversal = config.traversal;

    let results: Vec<Result<Option<u64>>> = thread::scope(|s| {
        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|mut comm| {
                s.spawn(move || {
                    let result = run_worker(&mut comm, n, traversal);
                    if let Err(err) = &result {
                        comm.abort(&err.to_string());
                    }
                    result
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(AbacusError::Collective("a worker panicked mid-run".into()))
                })
            })
            .collect()
    });

    let mut distinct = None;
    for result in results {
        if let Some(total) = result? {
            distinct = Some(total);
        }
    }
    let distinct = distinct
        .ok_or_else(|| AbacusError::Collective("the coordinator produced no result".into()))?;

    Ok(CountReport {
        n: config.n,
        workers: config.workers,
        distinct,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
