//! Cancellable timer queue.
//!
//! The queue does not use internal threads or sleep. It records deadlines on
//! the local wall clock and the caller drains whatever is due with
//! [`TimerQueue::pop_due`]; the caller decides how to wait until
//! [`TimerQueue::next_due`].
//!
//! Every arm call returns a [`TimerHandle`]. Each logical [`TimerSlot`] holds
//! at most one armed timer: arming a slot cancels whatever that slot held
//! before. Cancelling is idempotent, and a handle that has been superseded or
//! cancelled never fires again.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Logical timer slots owned by the check-in engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerSlot {
    /// One-shot popup trigger.
    Trigger,
    /// One-shot grace period after a popup fired.
    Grace,
    /// Recurring missed-time counter tick.
    MissedTick,
}

/// Identity of one arming of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle {
    slot: TimerSlot,
    id: u64,
}

impl TimerHandle {
    pub fn slot(&self) -> TimerSlot {
        self.slot
    }
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub handle: TimerHandle,
    /// Scheduled deadline, which may be earlier than the drain instant.
    pub due: NaiveDateTime,
}

#[derive(Debug, Clone)]
struct Armed {
    handle: TimerHandle,
    due: NaiveDateTime,
    every: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    next_id: u64,
    armed: Vec<Armed>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot timer in `slot`, replacing any timer already there.
    pub fn arm_once(&mut self, slot: TimerSlot, due: NaiveDateTime) -> TimerHandle {
        self.arm(slot, due, None)
    }

    /// Arm a recurring timer in `slot` that first fires at `first` and then
    /// every `every`. Non-positive periods are clamped to one millisecond.
    pub fn arm_every(
        &mut self,
        slot: TimerSlot,
        first: NaiveDateTime,
        every: Duration,
    ) -> TimerHandle {
        let every = every.max(Duration::milliseconds(1));
        self.arm(slot, first, Some(every))
    }

    fn arm(&mut self, slot: TimerSlot, due: NaiveDateTime, every: Option<Duration>) -> TimerHandle {
        self.cancel_slot(slot);
        self.next_id += 1;
        let handle = TimerHandle {
            slot,
            id: self.next_id,
        };
        tracing::debug!(?slot, id = handle.id, %due, "timer armed");
        self.armed.push(Armed { handle, due, every });
        handle
    }

    /// Cancel the timer identified by `handle`.
    ///
    /// Returns `true` if it was still armed. Stale handles are ignored.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.armed.len();
        self.armed.retain(|a| a.handle != handle);
        let removed = self.armed.len() != before;
        if removed {
            tracing::debug!(slot = ?handle.slot, id = handle.id, "timer cancelled");
        }
        removed
    }

    /// Cancel whatever is armed in `slot`.
    pub fn cancel_slot(&mut self, slot: TimerSlot) -> bool {
        let current = self.armed.iter().find(|a| a.handle.slot == slot).map(|a| a.handle);
        match current {
            Some(handle) => self.cancel(handle),
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        if !self.armed.is_empty() {
            tracing::debug!(count = self.armed.len(), "all timers cancelled");
        }
        self.armed.clear();
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.armed.iter().any(|a| a.handle == handle)
    }

    pub fn is_idle(&self) -> bool {
        self.armed.is_empty()
    }

    pub fn armed_in(&self, slot: TimerSlot) -> Option<TimerHandle> {
        self.armed.iter().find(|a| a.handle.slot == slot).map(|a| a.handle)
    }

    /// Earliest pending deadline.
    pub fn next_due(&self) -> Option<NaiveDateTime> {
        self.armed.iter().map(|a| a.due).min()
    }

    /// Remove and return the earliest timer whose deadline is at or before
    /// `now`. Ties go to the timer armed first. Recurring timers are
    /// re-armed one period after the deadline they fired for, so draining
    /// after a long gap yields every missed occurrence in order.
    pub fn pop_due(&mut self, now: NaiveDateTime) -> Option<Fired> {
        let index = self
            .armed
            .iter()
            .enumerate()
            .filter(|(_, a)| a.due <= now)
            .min_by_key(|(_, a)| (a.due, a.handle.id))
            .map(|(i, _)| i)?;

        let Armed { handle, due, every } = self.armed[index].clone();
        match every.and_then(|every| due.checked_add_signed(every)) {
            Some(next) => self.armed[index].due = next,
            None => {
                self.armed.swap_remove(index);
            }
        }
        Some(Fired { handle, due })
    }
}
