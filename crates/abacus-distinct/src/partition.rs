//! Balanced row partitioning.
//!
//! Splits the row range `[1, N]` into contiguous, non-overlapping chunks,
//! one per worker, with a size spread of at most one row. A worker whose
//! chunk is empty (more workers than rows) contributes no candidates but
//! still participates in every collective phase.

use abacus_core::WorkerContext;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// An inclusive range of table rows assigned to one worker.
///
/// Empty when `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    /// First row, 1-based.
    pub start: u32,
    /// Last row, inclusive.
    pub end: u32,
}

impl RowRange {
    /// Number of rows in the range.
    #[must_use]
    pub fn len(&self) -> u32 {
        if self.start > self.end {
            0
        } else {
            self.end - self.start + 1
        }
    }

    /// Whether the range holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Iterate the rows of the range.
    #[must_use]
    pub fn rows(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }
}

/// Compute this worker's row range.
///
/// Rows are dealt contiguously: `base = n / workers` rows each, with the
/// first `n % workers` workers taking one extra row. The ranges over all
/// ids partition `[1, n]` exactly.
#[must_use]
pub fn partition_rows(ctx: &WorkerContext) -> RowRange {
    let workers = ctx.workers as u32;
    let id = ctx.id as u32;
    let base = ctx.n / workers;
    let extra = ctx.n % workers;
    let rows = base + u32::from(id < extra);
    let start = 1 + id * base + id.min(extra);
    RowRange {
        start,
        end: start + rows - 1,
    }
}
