//! Check-in engine.
//!
//! Owns the whole session: window, popup scheduler, missed-time tracker and
//! the timer queue they share. It has no threads and never sleeps. Callers
//! pass the current wall-clock instant into every command and call
//! [`CheckinEngine::advance`] once [`CheckinEngine::next_deadline`] has
//! passed.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = CheckinEngine::new(policy, window, picker, log, notifier);
//! engine.start(now);
//! // whenever next_deadline() passes:
//! engine.advance(now);
//! // when the user clicks OK:
//! engine.acknowledge(now);
//! ```

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::missed::MissedTimeTracker;
use super::picker::WindowPicker;
use super::scheduler::{PopupScheduler, PopupState, ScheduleOutcome};
use crate::events::Event;
use crate::log::{format_clock, record, LogCategory, LogSink};
use crate::notify::{deliver, NotificationPermission, Notifier, NOTIFICATION_BODY, NOTIFICATION_TITLE};
use crate::timer::{Fired, TimerQueue, TimerSlot};
use crate::window::TimeWindow;

pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 60;
pub const DEFAULT_POPUPS_PER_SESSION: u32 = 2;
/// Longest accepted grace period: one day.
pub const MAX_GRACE_PERIOD_SECS: u64 = 86_400;

/// Fixed session rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinPolicy {
    pub grace_period_secs: u64,
    pub popups_per_session: u32,
}

impl Default for CheckinPolicy {
    fn default() -> Self {
        Self {
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
            popups_per_session: DEFAULT_POPUPS_PER_SESSION,
        }
    }
}

impl CheckinPolicy {
    pub fn grace_period(&self) -> Duration {
        let secs = self.grace_period_secs.min(MAX_GRACE_PERIOD_SECS) as i64;
        Duration::try_seconds(secs).unwrap_or_else(Duration::zero)
    }
}

/// What the confirmation surface should show right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationPrompt {
    pub fired_at: NaiveDateTime,
    /// `None` while the grace period is still running.
    pub missed_secs: Option<u64>,
    pub grace_period_secs: u64,
}

impl ConfirmationPrompt {
    pub const TITLE: &'static str = "Confirm You're Here";

    pub fn message(&self) -> String {
        format!("Popup at {}", format_clock(self.fired_at))
    }
}

pub struct CheckinEngine {
    pub(super) policy: CheckinPolicy,
    pub(super) window: TimeWindow,
    pub(super) picker: WindowPicker,
    pub(super) timers: TimerQueue,
    pub(super) scheduler: PopupScheduler,
    pub(super) tracker: MissedTimeTracker,
    pub(super) log: Box<dyn LogSink>,
    notifier: Box<dyn Notifier>,
    permission: NotificationPermission,
    on_break: bool,
}

impl CheckinEngine {
    pub fn new(
        policy: CheckinPolicy,
        window: TimeWindow,
        picker: WindowPicker,
        log: Box<dyn LogSink>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            policy,
            window,
            picker,
            timers: TimerQueue::new(),
            scheduler: PopupScheduler::new(policy.popups_per_session),
            tracker: MissedTimeTracker::new(policy.grace_period()),
            log,
            notifier,
            permission: NotificationPermission::Default,
            on_break: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn policy(&self) -> CheckinPolicy {
        self.policy
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn state(&self) -> PopupState {
        self.scheduler.state()
    }

    pub fn session_count(&self) -> u32 {
        self.scheduler.session_count()
    }

    pub fn pending_trigger(&self) -> Option<NaiveDateTime> {
        self.scheduler.pending().map(|p| p.at)
    }

    pub fn missed_secs(&self) -> u64 {
        self.tracker.missed_secs()
    }

    pub fn on_break(&self) -> bool {
        self.on_break
    }

    pub fn permission(&self) -> NotificationPermission {
        self.permission
    }

    /// Earliest instant at which `advance` has work to do.
    pub fn next_deadline(&self) -> Option<NaiveDateTime> {
        self.timers.next_due()
    }

    /// True when no trigger, grace or counter timer is armed.
    pub fn is_quiescent(&self) -> bool {
        self.timers.is_idle()
    }

    /// The confirmation surface, if one should be visible.
    pub fn prompt(&self) -> Option<ConfirmationPrompt> {
        let fired_at = self.scheduler.fired_at()?;
        let missed_secs = match self.scheduler.state() {
            PopupState::Idle => return None,
            PopupState::AwaitingAck => None,
            PopupState::Overdue => Some(self.tracker.missed_secs()),
        };
        Some(ConfirmationPrompt {
            fired_at,
            missed_secs,
            grace_period_secs: self.policy.grace_period_secs,
        })
    }

    pub fn snapshot(&self, now: NaiveDateTime) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            session_count: self.session_count(),
            popups_per_session: self.policy.popups_per_session,
            pending_trigger: self.pending_trigger(),
            missed_secs: self.missed_secs(),
            on_break: self.on_break,
            window: self.window,
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin the session: resolve notification permission, then schedule
    /// the first popup.
    pub fn start(&mut self, now: NaiveDateTime) -> Vec<Event> {
        self.permission = self.notifier.request_permission();
        record(
            self.log.as_mut(),
            now,
            LogCategory::Action,
            format!("Notification permission: {}", self.permission),
        );
        let mut events = vec![Event::SessionStarted {
            window: self.window,
            permission: self.permission,
            at: now,
        }];
        events.extend(self.schedule_next(now));
        events
    }

    /// Replace the window. Cancels every timer, zeroes every counter and
    /// schedules afresh.
    pub fn reconfigure(&mut self, window: TimeWindow, now: NaiveDateTime) -> Vec<Event> {
        self.window = window;
        self.reset();
        tracing::info!(%window, "session reset");
        let mut events = vec![Event::SessionReset { window, at: now }];
        events.extend(self.schedule_next(now));
        events
    }

    /// Full session reset without rescheduling.
    pub fn reset(&mut self) {
        self.tracker.reset(&mut self.timers);
        self.scheduler.reset(&mut self.timers);
        self.timers.cancel_all();
    }

    pub fn toggle_break(&mut self, now: NaiveDateTime) -> Event {
        self.on_break = !self.on_break;
        let label = if self.on_break { "In" } else { "Out" };
        record(
            self.log.as_mut(),
            now,
            LogCategory::Action,
            format!("Break {label} clicked"),
        );
        Event::BreakToggled {
            on_break: self.on_break,
            at: now,
        }
    }

    /// Dispatch every timer due at or before `now`, in deadline order.
    pub fn advance(&mut self, now: NaiveDateTime) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(fired) = self.timers.pop_due(now) {
            if let Some(event) = self.dispatch(fired, now) {
                events.push(event);
            }
        }
        events
    }

    pub(super) fn schedule_next(&mut self, now: NaiveDateTime) -> Option<Event> {
        let outcome = self.scheduler.schedule_next(
            &self.window,
            now,
            &mut self.picker,
            &mut self.timers,
            self.log.as_mut(),
        );
        match outcome {
            ScheduleOutcome::Scheduled(trigger_at) => {
                tracing::info!(%trigger_at, "popup scheduled");
                Some(Event::PopupScheduled {
                    trigger_at,
                    session_count: self.scheduler.session_count(),
                    at: now,
                })
            }
            ScheduleOutcome::Inactive => Some(Event::WindowInactive {
                window: self.window,
                at: now,
            }),
            ScheduleOutcome::CapReached => None,
        }
    }

    fn dispatch(&mut self, fired: Fired, now: NaiveDateTime) -> Option<Event> {
        match fired.handle.slot() {
            TimerSlot::Trigger => {
                let popup = self
                    .scheduler
                    .on_fire(fired.handle, now, &mut self.timers, self.log.as_mut())?;
                deliver(
                    self.notifier.as_mut(),
                    self.permission,
                    NOTIFICATION_TITLE,
                    NOTIFICATION_BODY,
                );
                self.tracker.on_popup_fired(popup.fired_at, &mut self.timers);
                tracing::info!(
                    scheduled_for = %popup.scheduled_for,
                    fired_at = %popup.fired_at,
                    session_count = popup.session_count,
                    "popup shown"
                );
                Some(Event::PopupShown {
                    scheduled_for: popup.scheduled_for,
                    session_count: popup.session_count,
                    at: popup.fired_at,
                })
            }
            TimerSlot::Grace => {
                if !self
                    .tracker
                    .on_grace_elapsed(fired.handle, fired.due, &mut self.timers)
                {
                    return None;
                }
                self.scheduler.mark_overdue();
                tracing::info!(due = %fired.due, "grace period elapsed");
                Some(Event::GracePeriodElapsed {
                    session_count: self.scheduler.session_count(),
                    at: fired.due,
                })
            }
            TimerSlot::MissedTick => {
                self.tracker.on_tick(fired.handle);
                None
            }
        }
    }
}

impl std::fmt::Debug for CheckinEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckinEngine")
            .field("policy", &self.policy)
            .field("window", &self.window)
            .field("scheduler", &self.scheduler)
            .field("tracker", &self.tracker)
            .field("timers", &self.timers)
            .field("on_break", &self.on_break)
            .finish_non_exhaustive()
    }
}
