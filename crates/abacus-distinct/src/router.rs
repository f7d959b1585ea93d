//! Owner routing and per-destination buffering.
//!
//! Every candidate value is routed to a single deterministic owner, chosen
//! by a pure function of the value alone. Because every producer applies
//! the same function, all occurrences of a value land on the same worker
//! and per-worker distinct sets can never overlap. No deduplication happens
//! here; duplicates are expected and deferred to the owner.

use crate::partition::RowRange;
use abacus_core::{safe_mod, WorkerContext, WorkerId};
use serde::{Deserialize, Serialize};

/// Column generation strategy per row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Traversal {
    /// Walk every column: j in `1..=N`.
    Full,
    /// Walk j in `i..=N`, relying on the symmetry i*j = j*i to still cover
    /// every distinct value while roughly halving generated candidates.
    #[default]
    Triangular,
}

/// The worker that owns a candidate value.
///
/// Pure and stateless: the same value maps to the same owner on every call,
/// independent of which worker produced it or when. Defined for the full
/// signed domain even though table products are non-negative.
#[inline]
#[must_use]
pub fn owner_of(value: i64, workers: usize) -> WorkerId {
    safe_mod(value, workers)
}

/// Per-destination outgoing buffers.
///
/// One growable lane per destination worker. Lanes grow geometrically
/// (`Vec` doubling), so appends are amortized O(1) with no a-priori cap.
#[derive(Debug, Clone)]
pub struct OutgoingBuffers {
    lanes: Vec<Vec<i64>>,
}

impl OutgoingBuffers {
    /// Create empty buffers for a pool of `workers` destinations.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            lanes: vec![Vec::new(); workers],
        }
    }

    /// Append a value to the lane for `owner`.
    #[inline]
    pub fn push(&mut self, owner: WorkerId, value: i64) {
        self.lanes[owner].push(value);
    }

    /// Number of buffered values per destination.
    #[must_use]
    pub fn counts(&self) -> Vec<usize> {
        self.lanes.iter().map(Vec::len).collect()
    }

    /// Total number of buffered values.
    #[must_use]
    pub fn total(&self) -> usize {
        self.lanes.iter().map(Vec::len).sum()
    }

    /// Flatten into a single buffer ordered by destination id.
    ///
    /// Within each destination's span, values keep their insertion order.
    #[must_use]
    pub fn flatten(self) -> Vec<i64> {
        let mut flat = Vec::with_capacity(self.total());
        for lane in self.lanes {
            flat.extend_from_slice(&lane);
        }
        flat
    }
}

/// Generate this worker's candidates and buffer them by owner.
///
/// Products are computed in 64-bit arithmetic before routing.
#[must_use]
pub fn route_products(
    ctx: &WorkerContext,
    range: &RowRange,
    traversal: Traversal,
) -> OutgoingBuffers {
    let mut outgoing = OutgoingBuffers::new(ctx.workers);
    for i in range.rows() {
        let first_column = match traversal {
            Traversal::Full => 1,
            Traversal::Triangular => i,
        };
        for j in first_column..=ctx.n {
            let product = i64::from(i) * i64::from(j);
            outgoing.push(owner_of(product, ctx.workers), product);
        }
    }
    outgoing
}
