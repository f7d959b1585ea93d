//! The two-round bulk exchange.
//!
//! Round one is an all-to-all of single counts, so every worker learns how
//! much each peer will send it. From those counts each worker derives an
//! [`ExchangePlan`] independently, then round two moves the variable-length
//! payloads in one coordinated step. After both rounds a worker holds
//! exactly the multiset of candidates it owns, contributed by every worker
//! including itself.

use crate::comm::Collective;
use crate::router::OutgoingBuffers;
use abacus_core::{AbacusError, Result};

/// Derived layout of one payload exchange. Never mutated after computation.
///
/// Offsets are exclusive prefix sums of the matching counts: destination
/// `d`'s span of the flattened send buffer is
/// `send_offsets[d] .. send_offsets[d] + send_counts[d]`, and source `s`'s
/// span of the receive buffer is laid out the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangePlan {
    /// Values this worker sends to each destination.
    pub send_counts: Vec<usize>,
    /// Start of each destination's span in the flattened send buffer.
    pub send_offsets: Vec<usize>,
    /// Values this worker receives from each source.
    pub recv_counts: Vec<usize>,
    /// Start of each source's span in the receive buffer.
    pub recv_offsets: Vec<usize>,
    /// Total values sent.
    pub total_send: usize,
    /// Total values received.
    pub total_recv: usize,
}

impl ExchangePlan {
    /// Derive a plan from the two count vectors.
    pub fn new(send_counts: Vec<usize>, recv_counts: Vec<usize>) -> Result<Self> {
        let (send_offsets, total_send) = exclusive_prefix_sum(&send_counts)?;
        let (recv_offsets, total_recv) = exclusive_prefix_sum(&recv_counts)?;
        Ok(Self {
            send_counts,
            send_offsets,
            recv_counts,
            recv_offsets,
            total_send,
            total_recv,
        })
    }

    /// Number of workers the plan spans.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.send_counts.len()
    }
}

fn exclusive_prefix_sum(counts: &[usize]) -> Result<(Vec<usize>, usize)> {
    let mut offsets = Vec::with_capacity(counts.len());
    let mut total: usize = 0;
    for &count in counts {
        offsets.push(total);
        total = total.checked_add(count).ok_or_else(|| {
            AbacusError::Allocation("exchange size overflows the address space".into())
        })?;
    }
    Ok((offsets, total))
}

/// Run the full two-round exchange for this worker's outgoing buffers.
///
/// Returns the receive buffer (the multiset of candidates this worker owns)
/// together with the plan that produced it. A worker that receives nothing
/// gets an empty, valid buffer.
pub fn exchange<C: Collective>(
    comm: &mut C,
    outgoing: OutgoingBuffers,
) -> Result<(Vec<i64>, ExchangePlan)> {
    let send_counts = outgoing.counts();
    let recv_counts = comm.exchange_counts(&send_counts)?;
    let plan = ExchangePlan::new(send_counts, recv_counts)?;
    let send_buffer = outgoing.flatten();
    let recv_buffer = comm.exchange_payload(&send_buffer, &plan)?;
    Ok((recv_buffer, plan))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_prefix_sum() {
        let (offsets, total) = exclusive_prefix_sum(&[3, 0, 2, 5]).unwrap();
        assert_eq!(offsets, vec![0, 3, 3, 5]);
        assert_eq!(total, 10);
    }

    #[test]
    fn test_empty_counts() {
        let (offsets, total) = exclusive_prefix_sum(&[]).unwrap();
        assert!(offsets.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_prefix_sum_overflow_is_rejected() {
        let err = exclusive_prefix_sum(&[usize::MAX, 1]).unwrap_err();
        assert!(matches!(err, AbacusError::Allocation(_)));
    }

    #[test]
    fn test_plan_layout() {
        let plan = ExchangePlan::new(vec![2, 1, 0], vec![0, 4, 1]).unwrap();
        assert_eq!(plan.workers(), 3);
        assert_eq!(plan.send_offsets, vec![0, 2, 3]);
        assert_eq!(plan.total_send, 3);
        assert_eq!(plan.recv_offsets, vec![0, 0, 4]);
        assert_eq!(plan.total_recv, 5);
    }

    #[test]
    fn test_zero_plan() {
        let plan = ExchangePlan::new(vec![0, 0], vec![0, 0]).unwrap();
        assert_eq!(plan.total_send, 0);
        assert_eq!(plan.total_recv, 0);
    }
}
