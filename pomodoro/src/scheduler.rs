//! Deadline queue backing `Host::schedule_callback`.

use crate::engine::TickToken;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct TickScheduler {
    queue: BinaryHeap<Reverse<(Instant, u64, TickToken)>>,
    // Breaks deadline ties in insertion order.
    seq: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, token: TickToken) {
        self.seq += 1;
        self.queue.push(Reverse((now + delay, self.seq, token)));
    }

    /// Remove and return every token whose deadline is at or before `now`,
    /// earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<TickToken> {
        let mut due = Vec::new();
        while let Some(Reverse((deadline, _, token))) = self.queue.peek().copied() {
            if deadline > now {
                break;
            }
            self.queue.pop();
            due.push(token);
        }
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.peek().map(|Reverse((deadline, _, _))| *deadline)
    }
}
