//! Missed-time tracking.
//!
//! A fired popup first gets a one-shot grace timer. Only if that elapses does
//! a recurring one-second counter start, so a prompt acknowledgement never
//! runs the counter at all.

use chrono::{Duration, NaiveDateTime};

use crate::timer::{TimerHandle, TimerQueue, TimerSlot};

/// Granularity of the missed-time counter.
pub const MISSED_TICK_SECS: i64 = 1;

#[derive(Debug, Clone)]
pub struct MissedTimeTracker {
    grace: Duration,
    missed_secs: u64,
    grace_timer: Option<TimerHandle>,
    counter: Option<TimerHandle>,
}

impl MissedTimeTracker {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            missed_secs: 0,
            grace_timer: None,
            counter: None,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace
    }

    pub fn missed_secs(&self) -> u64 {
        self.missed_secs
    }

    pub fn is_counting(&self) -> bool {
        self.counter.is_some()
    }

    pub fn in_grace(&self) -> bool {
        self.grace_timer.is_some()
    }

    /// Start the grace period for a popup that fired at `fired_at`.
    pub fn on_popup_fired(&mut self, fired_at: NaiveDateTime, timers: &mut TimerQueue) {
        self.stop(timers);
        self.missed_secs = 0;
        let due = fired_at
            .checked_add_signed(self.grace)
            .unwrap_or(NaiveDateTime::MAX);
        self.grace_timer = Some(timers.arm_once(TimerSlot::Grace, due));
    }

    /// Grace timer `handle` came due at `due`. Starts the counter and
    /// returns `true`, or returns `false` for a stale handle.
    pub fn on_grace_elapsed(
        &mut self,
        handle: TimerHandle,
        due: NaiveDateTime,
        timers: &mut TimerQueue,
    ) -> bool {
        if self.grace_timer != Some(handle) {
            return false;
        }
        self.grace_timer = None;
        let tick = Duration::seconds(MISSED_TICK_SECS);
        self.counter = due
            .checked_add_signed(tick)
            .map(|first| timers.arm_every(TimerSlot::MissedTick, first, tick));
        true
    }

    /// Counter tick. Stale handles are ignored.
    pub fn on_tick(&mut self, handle: TimerHandle) -> bool {
        if self.counter != Some(handle) {
            return false;
        }
        self.missed_secs += MISSED_TICK_SECS as u64;
        true
    }

    /// Stop both timers and hand back the frozen count, leaving zero behind.
    /// Safe to call when nothing is running.
    pub fn on_acknowledge(&mut self, timers: &mut TimerQueue) -> u64 {
        self.stop(timers);
        std::mem::take(&mut self.missed_secs)
    }

    /// Cancel timers and clear the count.
    pub fn reset(&mut self, timers: &mut TimerQueue) {
        self.stop(timers);
        self.missed_secs = 0;
    }

    fn stop(&mut self, timers: &mut TimerQueue) {
        if let Some(h) = self.grace_timer.take() {
            timers.cancel(h);
        }
        if let Some(h) = self.counter.take() {
            timers.cancel(h);
        }
    }
}
