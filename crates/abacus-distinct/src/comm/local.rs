//! In-process worker group over a channel mesh.
//!
//! [`LocalGroup::connect`] builds one unbounded channel per worker and
//! hands every endpoint a sender to each of them, so any worker can reach
//! any other (including itself) directly. No memory is shared between
//! workers; the mesh is the only cross-worker interaction.
//!
//! Phases are matched by a per-endpoint sequence number stamped on every
//! frame. All workers issue the same collective calls in the same order, so
//! the sequence numbers line up; a frame from a later phase (a peer that
//! finished sending and raced ahead) is stashed until its phase starts,
//! while a frame from an earlier phase, of the wrong type, or of the wrong
//! length fails the run. A worker that errors or panics mid-run tells its
//! peers via an abort frame, so the group tears down instead of hanging on
//! a receive that can never complete.

use super::Collective;
use crate::exchange::ExchangePlan;
use abacus_core::{AbacusError, Result, WorkerId};
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};

enum Payload {
    Scalar(u64),
    Count(usize),
    Values(Vec<i64>),
    Abort(String),
}

struct Frame {
    src: WorkerId,
    seq: u64,
    payload: Payload,
}

/// A fixed pool of in-process workers wired as a full channel mesh.
pub struct LocalGroup {
    endpoints: Vec<LocalCollective>,
}

impl LocalGroup {
    /// Build the mesh for `workers` endpoints.
    pub fn connect(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(AbacusError::Usage(
                "worker count must be at least 1".into(),
            ));
        }
        let mut senders = Vec::with_capacity(workers);
        let mut inboxes = Vec::with_capacity(workers);
        for _ in 0..workers {
            let (tx, rx) = channel();
            senders.push(tx);
            inboxes.push(rx);
        }
        let endpoints = inboxes
            .into_iter()
            .enumerate()
            .map(|(id, inbox)| LocalCollective {
                id,
                peers: senders.clone(),
                inbox,
                stash: VecDeque::new(),
                seq: 0,
            })
            .collect();
        Ok(Self { endpoints })
    }

    /// Number of endpoints in the group.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.endpoints.len()
    }

    /// Take the endpoints, one per worker, to move onto worker threads.
    #[must_use]
    pub fn into_endpoints(self) -> Vec<LocalCollective> {
        self.endpoints
    }
}

/// One worker's endpoint of a [`LocalGroup`] mesh.
pub struct LocalCollective {
    id: WorkerId,
    peers: Vec<Sender<Frame>>,
    inbox: Receiver<Frame>,
    stash: VecDeque<Frame>,
    seq: u64,
}

impl LocalCollective {
    fn send_to(&self, dest: WorkerId, payload: Payload) -> Result<()> {
        self.peers[dest]
            .send(Frame {
                src: self.id,
                seq: self.seq,
                payload,
            })
            .map_err(|_| {
                AbacusError::Collective(format!(
                    "worker {dest} is gone; phase {} cannot complete",
                    self.seq
                ))
            })
    }

    /// Receive the next frame belonging to the current phase.
    fn recv_for_phase(&mut self) -> Result<Frame> {
        if let Some(pos) = self.stash.iter().position(|f| f.seq == self.seq) {
            if let Some(frame) = self.stash.remove(pos) {
                return Ok(frame);
            }
        }
        loop {
            let frame = self.inbox.recv().map_err(|_| {
                AbacusError::Collective(format!(
                    "a peer disconnected during phase {}",
                    self.seq
                ))
            })?;
            if let Payload::Abort(reason) = &frame.payload {
                return Err(AbacusError::Collective(format!(
                    "worker {} aborted the run: {reason}",
                    frame.src
                )));
            }
            if frame.seq == self.seq {
                return Ok(frame);
            }
            if frame.seq > self.seq {
                // A peer already moved on to a later phase.
                self.stash.push_back(frame);
                continue;
            }
            return Err(AbacusError::Collective(format!(
                "stale frame from worker {}: phase {} while in phase {}",
                frame.src, frame.seq, self.seq
            )));
        }
    }

    /// Tell every peer the run is over. Peers blocked in a receive fail
    /// immediately instead of waiting for a frame that will never come.
    /// Send failures are ignored; a peer that already finished has no inbox.
    pub fn abort(&self, reason: &str) {
        for (dest, peer) in self.peers.iter().enumerate() {
            if dest == self.id {
                continue;
            }
            let _ = peer.send(Frame {
                src: self.id,
                seq: self.seq,
                payload: Payload::Abort(reason.to_string()),
            });
        }
    }
}

impl Collective for LocalCollective {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn workers(&self) -> usize {
        self.peers.len()
    }

    fn broadcast(&mut self, value: u64, root: WorkerId) -> Result<u64> {
        self.seq += 1;
        if self.id == root {
            for dest in 0..self.workers() {
                self.send_to(dest, Payload::Scalar(value))?;
            }
        }
        let frame = self.recv_for_phase()?;
        match frame.payload {
            Payload::Scalar(v) if frame.src == root => Ok(v),
            _ => Err(AbacusError::Collective(format!(
                "unexpected frame from worker {} during broadcast",
                frame.src
            ))),
        }
    }

    fn exchange_counts(&mut self, send_counts: &[usize]) -> Result<Vec<usize>> {
        self.seq += 1;
        let workers = self.workers();
        if send_counts.len() != workers {
            return Err(AbacusError::Collective(format!(
                "count vector spans {} workers, group has {workers}",
                send_counts.len()
            )));
        }
        for (dest, &count) in send_counts.iter().enumerate() {
            self.send_to(dest, Payload::Count(count))?;
        }
        let mut received: Vec<Option<usize>> = vec![None; workers];
        for _ in 0..workers {
            let frame = self.recv_for_phase()?;
            let Payload::Count(count) = frame.payload else {
                return Err(AbacusError::Collective(format!(
                    "unexpected frame from worker {} during count exchange",
                    frame.src
                )));
            };
            if frame.src >= workers || received[frame.src].replace(count).is_some() {
                return Err(AbacusError::Collective(format!(
                    "duplicate count frame from worker {}",
                    frame.src
                )));
            }
        }
        received
            .into_iter()
            .enumerate()
            .map(|(src, count)| {
                count.ok_or_else(|| {
                    AbacusError::Collective(format!("no count frame from worker {src}"))
                })
            })
            .collect()
    }

    fn exchange_payload(&mut self, send: &[i64], plan: &ExchangePlan) -> Result<Vec<i64>> {
        self.seq += 1;
        let workers = self.workers();
        if plan.workers() != workers {
            return Err(AbacusError::Collective(format!(
                "exchange plan spans {} workers, group has {workers}",
                plan.workers()
            )));
        }
        if send.len() != plan.total_send {
            return Err(AbacusError::Collective(format!(
                "send buffer holds {} values, plan promised {}",
                send.len(),
                plan.total_send
            )));
        }
        for dest in 0..workers {
            let start = plan.send_offsets[dest];
            let end = start + plan.send_counts[dest];
            self.send_to(dest, Payload::Values(send[start..end].to_vec()))?;
        }
        let mut received = vec![0i64; plan.total_recv];
        let mut seen = vec![false; workers];
        for _ in 0..workers {
            let frame = self.recv_for_phase()?;
            let Payload::Values(values) = frame.payload else {
                return Err(AbacusError::Collective(format!(
                    "unexpected frame from worker {} during payload exchange",
                    frame.src
                )));
            };
            let src = frame.src;
            if src >= workers || seen[src] {
                return Err(AbacusError::Collective(format!(
                    "duplicate payload frame from worker {src}"
                )));
            }
            seen[src] = true;
            if values.len() != plan.recv_counts[src] {
                return Err(AbacusError::Collective(format!(
                    "worker {src} sent {} values, plan promised {}",
                    values.len(),
                    plan.recv_counts[src]
                )));
            }
            let start = plan.recv_offsets[src];
            received[start..start + values.len()].copy_from_slice(&values);
        }
        Ok(received)
    }

    fn reduce_sum(&mut self, local: u64, root: WorkerId) -> Result<Option<u64>> {
        self.seq += 1;
        self.send_to(root, Payload::Scalar(local))?;
        if self.id != root {
            return Ok(None);
        }
        let workers = self.workers();
        let mut total: u64 = 0;
        let mut seen = vec![false; workers];
        for _ in 0..workers {
            let frame = self.recv_for_phase()?;
            let Payload::Scalar(value) = frame.payload else {
                return Err(AbacusError::Collective(format!(
                    "unexpected frame from worker {} during reduction",
                    frame.src
                )));
            };
            if frame.src >= workers || seen[frame.src] {
                return Err(AbacusError::Collective(format!(
                    "duplicate reduction frame from worker {}",
                    frame.src
                )));
            }
            seen[frame.src] = true;
            total += value;
        }
        Ok(Some(total))
    }
}

impl Drop for LocalCollective {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.abort("worker panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn run_group<F, T>(workers: usize, f: F) -> Vec<Result<T>>
    where
        F: Fn(&mut LocalCollective) -> Result<T> + Copy + Send,
        T: Send,
    {
        let endpoints = LocalGroup::connect(workers).unwrap().into_endpoints();
        thread::scope(|s| {
            let handles: Vec<_> = endpoints
                .into_iter()
                .map(|mut comm| s.spawn(move || f(&mut comm)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }

    #[test]
    fn test_connect_rejects_empty_group() {
        assert!(LocalGroup::connect(0).is_err());
        assert_eq!(LocalGroup::connect(3).unwrap().workers(), 3);
    }

    #[test]
    fn test_broadcast_delivers_root_value() {
        let results = run_group(4, |comm| comm.broadcast(comm.id() as u64 + 100, 2));
        for result in results {
            assert_eq!(result.unwrap(), 102);
        }
    }

    #[test]
    fn test_exchange_counts_transposes() {
        // Worker w sends count w*10 + dest to dest, so w receives
        // [src*10 + w for each src].
        let results = run_group(3, |comm| {
            let me = comm.id();
            let counts: Vec<usize> = (0..3).map(|dest| me * 10 + dest).collect();
            comm.exchange_counts(&counts)
        });
        for (me, result) in results.into_iter().enumerate() {
            let expected: Vec<usize> = (0..3).map(|src| src * 10 + me).collect();
            assert_eq!(result.unwrap(), expected);
        }
    }

    #[test]
    fn test_exchange_payload_places_by_source_in_order() {
        // Worker w sends [w*100 + dest, w*100 + dest + 50] to every dest.
        let results = run_group(3, |comm| {
            let me = comm.id() as i64;
            let mut send = Vec::new();
            for dest in 0..3i64 {
                send.push(me * 100 + dest);
                send.push(me * 100 + dest + 50);
            }
            let plan = ExchangePlan::new(vec![2, 2, 2], vec![2, 2, 2])?;
            comm.exchange_payload(&send, &plan)
        });
        for (me, result) in results.into_iter().enumerate() {
            let me = me as i64;
            let expected: Vec<i64> = (0..3i64)
                .flat_map(|src| [src * 100 + me, src * 100 + me + 50])
                .collect();
            assert_eq!(result.unwrap(), expected);
        }
    }

    #[test]
    fn test_exchange_payload_zero_lengths() {
        // Worker 0 sends one value to worker 1; every other pair is empty.
        let results = run_group(2, |comm| {
            let (send, send_counts) = if comm.id() == 0 {
                (vec![7i64], vec![0, 1])
            } else {
                (vec![], vec![0, 0])
            };
            let recv_counts = comm.exchange_counts(&send_counts)?;
            let plan = ExchangePlan::new(send_counts, recv_counts)?;
            comm.exchange_payload(&send, &plan)
        });
        assert_eq!(results[0].as_ref().unwrap(), &Vec::<i64>::new());
        assert_eq!(results[1].as_ref().unwrap(), &vec![7]);
    }

    #[test]
    fn test_reduce_sum_at_root_only() {
        let results = run_group(5, |comm| comm.reduce_sum(comm.id() as u64 + 1, 0));
        assert_eq!(results[0].as_ref().unwrap(), &Some(15));
        for result in &results[1..] {
            assert_eq!(result.as_ref().unwrap(), &None);
        }
    }

    #[test]
    fn test_single_worker_group() {
        let results = run_group(1, |comm| {
            let n = comm.broadcast(9, 0)?;
            let counts = comm.exchange_counts(&[3])?;
            let plan = ExchangePlan::new(vec![3], counts)?;
            let values = comm.exchange_payload(&[1, 2, 3], &plan)?;
            let sum = comm.reduce_sum(n + values.len() as u64, 0)?;
            Ok((values, sum))
        });
        let (values, sum) = results.into_iter().next().unwrap().unwrap();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(sum, Some(12));
    }

    #[test]
    fn test_mismatched_phases_fail() {
        // Worker 0 broadcasts while worker 1 exchanges counts: worker 1
        // sees a scalar frame in a count phase and must fail, not hang.
        let endpoints = LocalGroup::connect(2).unwrap().into_endpoints();
        let mut iter = endpoints.into_iter();
        let mut c0 = iter.next().unwrap();
        let mut c1 = iter.next().unwrap();
        thread::scope(|s| {
            let h0 = s.spawn(move || c0.broadcast(5, 0));
            let h1 = s.spawn(move || c1.exchange_counts(&[1, 1]));
            // Worker 0 may or may not see the stray count frame first;
            // worker 1 must fail either way.
            let _ = h0.join().unwrap();
            let err = h1.join().unwrap().unwrap_err();
            assert!(matches!(err, AbacusError::Collective(_)));
        });
    }

    #[test]
    fn test_wrong_count_vector_length_fails() {
        let results = run_group(1, |comm| comm.exchange_counts(&[1, 2, 3]));
        assert!(matches!(
            results.into_iter().next().unwrap(),
            Err(AbacusError::Collective(_))
        ));
    }

    #[test]
    fn test_abort_wakes_blocked_peer() {
        let endpoints = LocalGroup::connect(2).unwrap().into_endpoints();
        let mut iter = endpoints.into_iter();
        let c0 = iter.next().unwrap();
        let mut c1 = iter.next().unwrap();
        thread::scope(|s| {
            let h1 = s.spawn(move || c1.broadcast(0, 0));
            c0.abort("giving up");
            let err = h1.join().unwrap().unwrap_err();
            assert!(err.to_string().contains("giving up"));
        });
    }
}
