//! Popup scheduling.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --schedule_next--> (trigger armed) --fire--> AwaitingAck
//! AwaitingAck --grace elapsed--> Overdue
//! AwaitingAck | Overdue --acknowledge--> Idle
//! ```
//!
//! Once `session_count` reaches the cap, `schedule_next` is a no-op until
//! `reset`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::picker::WindowPicker;
use crate::log::{format_clock, record, LogCategory, LogSink};
use crate::timer::{TimerHandle, TimerQueue, TimerSlot};
use crate::window::TimeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PopupState {
    Idle,
    /// Popup visible, grace period running.
    AwaitingAck,
    /// Popup visible, missed-time counter running.
    Overdue,
}

impl PopupState {
    pub fn is_visible(&self) -> bool {
        !matches!(self, PopupState::Idle)
    }
}

/// The armed trigger. Replaced wholesale, never edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTrigger {
    pub at: NaiveDateTime,
    handle: TimerHandle,
}

/// Result of a scheduling request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled(NaiveDateTime),
    /// Window has no room left today.
    Inactive,
    /// Session already showed every popup it is allowed.
    CapReached,
}

/// Details captured when a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredPopup {
    pub scheduled_for: NaiveDateTime,
    pub fired_at: NaiveDateTime,
    pub session_count: u32,
}

#[derive(Debug, Clone)]
pub struct PopupScheduler {
    cap: u32,
    session_count: u32,
    pending: Option<ScheduledTrigger>,
    state: PopupState,
    fired_at: Option<NaiveDateTime>,
}

impl PopupScheduler {
    pub fn new(cap: u32) -> Self {
        Self {
            cap,
            session_count: 0,
            pending: None,
            state: PopupState::Idle,
            fired_at: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> PopupState {
        self.state
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn pending(&self) -> Option<ScheduledTrigger> {
        self.pending
    }

    pub fn fired_at(&self) -> Option<NaiveDateTime> {
        self.fired_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.session_count >= self.cap
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Pick and arm the next trigger.
    pub fn schedule_next(
        &mut self,
        window: &TimeWindow,
        now: NaiveDateTime,
        picker: &mut WindowPicker,
        timers: &mut TimerQueue,
        log: &mut dyn LogSink,
    ) -> ScheduleOutcome {
        if self.is_exhausted() {
            tracing::debug!(session_count = self.session_count, "popup cap reached");
            return ScheduleOutcome::CapReached;
        }

        match picker.pick_instant(window, now) {
            Some(trigger_at) => {
                // arm_once replaces whatever trigger the slot held
                let handle = timers.arm_once(TimerSlot::Trigger, trigger_at);
                self.pending = Some(ScheduledTrigger {
                    at: trigger_at,
                    handle,
                });
                record(
                    log,
                    now,
                    LogCategory::Action,
                    format!("Random popup scheduled at: {}", format_clock(trigger_at)),
                );
                record(log, now, LogCategory::Init, "You are checked in.");
                ScheduleOutcome::Scheduled(trigger_at)
            }
            None => {
                self.clear_pending(timers);
                record(log, now, LogCategory::Action, "You are not checked in");
                ScheduleOutcome::Inactive
            }
        }
    }

    /// Handle the trigger timer identified by `handle` firing at `now`.
    ///
    /// Returns `None` for a stale handle.
    pub fn on_fire(
        &mut self,
        handle: TimerHandle,
        now: NaiveDateTime,
        timers: &mut TimerQueue,
        log: &mut dyn LogSink,
    ) -> Option<FiredPopup> {
        let trigger = self.pending.filter(|p| p.handle == handle)?;
        self.clear_pending(timers);

        self.session_count = (self.session_count + 1).min(self.cap);
        self.state = PopupState::AwaitingAck;
        self.fired_at = Some(now);
        record(
            log,
            now,
            LogCategory::Popup,
            format!("Popup shown at {}", format_clock(now)),
        );
        Some(FiredPopup {
            scheduled_for: trigger.at,
            fired_at: now,
            session_count: self.session_count,
        })
    }

    pub fn mark_overdue(&mut self) {
        if self.state == PopupState::AwaitingAck {
            self.state = PopupState::Overdue;
        }
    }

    pub fn mark_idle(&mut self) {
        self.state = PopupState::Idle;
        self.fired_at = None;
    }

    /// New session: counter to zero and pending trigger cancelled.
    pub fn reset(&mut self, timers: &mut TimerQueue) {
        self.clear_pending(timers);
        self.session_count = 0;
        self.mark_idle();
    }

    fn clear_pending(&mut self, timers: &mut TimerQueue) {
        if let Some(stale) = self.pending.take() {
            timers.cancel(stale.handle);
        }
    }
}
