use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::checkin::{AckOutcome, PopupState};
use crate::notify::NotificationPermission;
use crate::window::TimeWindow;

/// Every state change of the check-in engine produces an Event.
/// Front ends render them; the simulator prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        window: TimeWindow,
        permission: NotificationPermission,
        at: NaiveDateTime,
    },
    /// A trigger timer was armed.
    PopupScheduled {
        trigger_at: NaiveDateTime,
        session_count: u32,
        at: NaiveDateTime,
    },
    /// The window has no room left today; nothing was armed.
    WindowInactive {
        window: TimeWindow,
        at: NaiveDateTime,
    },
    /// The trigger fired. `at` is the actual firing instant, which may lag
    /// `scheduled_for`.
    PopupShown {
        scheduled_for: NaiveDateTime,
        session_count: u32,
        at: NaiveDateTime,
    },
    /// Grace period ran out; the missed-time counter started.
    GracePeriodElapsed {
        session_count: u32,
        at: NaiveDateTime,
    },
    PopupAcknowledged {
        outcome: AckOutcome,
        missed_secs: u64,
        session_count: u32,
        at: NaiveDateTime,
    },
    /// Window reconfigured: counters cleared and every timer cancelled.
    SessionReset {
        window: TimeWindow,
        at: NaiveDateTime,
    },
    BreakToggled {
        on_break: bool,
        at: NaiveDateTime,
    },
    StateSnapshot {
        state: PopupState,
        session_count: u32,
        popups_per_session: u32,
        pending_trigger: Option<NaiveDateTime>,
        missed_secs: u64,
        on_break: bool,
        window: TimeWindow,
        at: NaiveDateTime,
    },
}

impl Event {
    pub fn at(&self) -> NaiveDateTime {
        match self {
            Event::SessionStarted { at, .. }
            | Event::PopupScheduled { at, .. }
            | Event::WindowInactive { at, .. }
            | Event::PopupShown { at, .. }
            | Event::GracePeriodElapsed { at, .. }
            | Event::PopupAcknowledged { at, .. }
            | Event::SessionReset { at, .. }
            | Event::BreakToggled { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}
