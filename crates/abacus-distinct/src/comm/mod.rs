//! Collective communication primitives.
//!
//! The counting pipeline consumes four collective operations from its
//! environment: a broadcast, an all-to-all of counts, a variable-length
//! all-to-all of payloads, and a sum reduction. [`Collective`] captures
//! that contract; [`LocalGroup`] realizes it for a fixed pool of in-process
//! workers wired as a full mesh of channels.
//!
//! Every collective call is a synchronous phase: all workers must call it,
//! in the same order, exactly once per run. A worker that skips or repeats
//! a call desynchronizes the group; the local realization detects this as a
//! phase mismatch and fails the run rather than producing a wrong count.

mod local;

pub use local::{LocalCollective, LocalGroup};

use crate::exchange::ExchangePlan;
use abacus_core::{Result, WorkerId};

/// The collective operations a worker pool supplies to the pipeline.
///
/// All methods are blocking, barrier-like points: no worker observes a
/// result until every worker has contributed its part of the phase.
pub trait Collective {
    /// This worker's id.
    fn id(&self) -> WorkerId;

    /// Total number of workers in the group.
    fn workers(&self) -> usize;

    /// Deliver `value` from `root` to every worker. Returns the root's
    /// value everywhere; the argument of non-root callers is ignored.
    fn broadcast(&mut self, value: u64, root: WorkerId) -> Result<u64>;

    /// All-to-all of one integer per pair: `send_counts[dest]` arrives at
    /// `dest` as the returned vector's entry for this worker.
    fn exchange_counts(&mut self, send_counts: &[usize]) -> Result<Vec<usize>>;

    /// Variable-length all-to-all. `send` is the flattened buffer laid out
    /// by `plan.send_offsets`; the returned buffer has length
    /// `plan.total_recv` and is laid out by `plan.recv_offsets`. Order is
    /// preserved within each source's contribution, and zero-length spans
    /// are valid for any pair.
    fn exchange_payload(&mut self, send: &[i64], plan: &ExchangePlan) -> Result<Vec<i64>>;

    /// Sum every worker's `local` at `root`. Returns `Some(sum)` at the
    /// root and `None` everywhere else.
    fn reduce_sum(&mut self, local: u64, root: WorkerId) -> Result<Option<u64>>;
}
