//! Deferred disconnect scheduling.
//!
//! Callers can ask for an endpoint to be torn down at a future point on
//! the engine clock. Pending tasks sit in a min-heap keyed by their
//! scheduled time, so a poll only inspects the earliest task instead of
//! scanning the whole queue; each poll drains every task whose time has
//! arrived. The host drives polling from its own loop, nominally every
//! [`POLL_INTERVAL`].

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::endpoint::Endpoint;

/// Nominal cadence for host-driven scheduler polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// One pending teardown.
#[derive(Debug)]
struct Task {
    /// Absolute engine time the teardown is due.
    at: f64,
    /// Insertion sequence; breaks ties so equal times fire in the
    /// order they were scheduled.
    seq: u64,
    target: Endpoint,
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.at.total_cmp(&other.at) == Ordering::Equal && self.seq == other.seq
    }
}

impl Eq for Task {}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .total_cmp(&other.at)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap of pending disconnect tasks, keyed by scheduled time.
#[derive(Debug, Default)]
pub(crate) struct DisconnectScheduler {
    heap: BinaryHeap<Reverse<Task>>,
    seq: u64,
}

impl DisconnectScheduler {
    /// Queues `target` for teardown at absolute engine time `at`.
    pub fn schedule(&mut self, target: Endpoint, at: f64) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Reverse(Task { at, seq, target }));
    }

    /// Removes and returns every task due at or before `now`, earliest
    /// first.
    pub fn due(&mut self, now: f64) -> Vec<Endpoint> {
        let mut fired = Vec::new();
        while let Some(Reverse(task)) = self.heap.peek() {
            if task.at > now {
                break;
            }
            if let Some(Reverse(task)) = self.heap.pop() {
                fired.push(task.target);
            }
        }
        fired
    }

    /// Number of tasks still pending.
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;

    fn node(n: u32) -> Endpoint {
        Endpoint::Node(NodeId(n))
    }

    #[test]
    fn fires_only_when_due() {
        let mut scheduler = DisconnectScheduler::default();
        scheduler.schedule(node(1), 2.0);

        assert!(scheduler.due(1.9).is_empty());
        assert_eq!(scheduler.due(2.0), vec![node(1)]);
        assert!(scheduler.due(3.0).is_empty(), "a fired task never refires");
    }

    #[test]
    fn drains_earliest_first() {
        let mut scheduler = DisconnectScheduler::default();
        scheduler.schedule(node(3), 3.0);
        scheduler.schedule(node(1), 1.0);
        scheduler.schedule(node(2), 2.0);

        assert_eq!(scheduler.due(2.5), vec![node(1), node(2)]);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn equal_times_fire_in_schedule_order() {
        let mut scheduler = DisconnectScheduler::default();
        scheduler.schedule(node(7), 1.0);
        scheduler.schedule(node(8), 1.0);
        scheduler.schedule(node(9), 1.0);

        assert_eq!(scheduler.due(1.0), vec![node(7), node(8), node(9)]);
    }
}
