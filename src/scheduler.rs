use crate::dom::NodeId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ToastId(pub u64);

/// Deferred page mutation. Plain data so the queue can be inspected and
/// replayed against a virtual clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    ShowToast(ToastId),
    DismissToast(ToastId),
    DetachElement(NodeId),
}

/// Timer queue over a virtual clock. Time only moves when the driver says so.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    seq: u64,
    queue: BTreeMap<(Duration, u64), TimerTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, task: TimerTask) -> Duration {
        let due = self.now + delay;
        self.seq += 1;
        self.queue.insert((due, self.seq), task);
        due
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pops the earliest task due at or before `until`, moving `now` to its
    /// due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerTask> {
        let key = *self.queue.keys().next()?;
        if key.0 > until {
            return None;
        }
        let task = self.queue.remove(&key)?;
        self.now = self.now.max(key.0);
        Some(task)
    }

    /// Moves the clock forward without running anything. Never goes back.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}
