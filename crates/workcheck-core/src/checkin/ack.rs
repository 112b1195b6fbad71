//! Acknowledgement handling: the only way a session moves on to its next
//! popup.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::engine::CheckinEngine;
use super::scheduler::PopupState;
use crate::events::Event;
use crate::log::{format_elapsed, record, LogCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckOutcome {
    /// Acknowledged inside the grace period.
    Prompt,
    /// Acknowledged after the grace period ran out.
    Late,
}

impl AckOutcome {
    pub fn classify(state: PopupState, missed_secs: u64) -> Self {
        if missed_secs > 0 || state == PopupState::Overdue {
            AckOutcome::Late
        } else {
            AckOutcome::Prompt
        }
    }

    pub fn category(&self) -> LogCategory {
        match self {
            AckOutcome::Prompt => LogCategory::PopupPrompt,
            AckOutcome::Late => LogCategory::PopupLate,
        }
    }
}

impl CheckinEngine {
    /// The user clicked OK.
    ///
    /// Stops missed-time tracking, logs the outcome and, while the session
    /// still has popups left, schedules the next one. With no popup visible
    /// this does nothing and returns an empty list.
    pub fn acknowledge(&mut self, now: NaiveDateTime) -> Vec<Event> {
        let state = self.scheduler.state();
        if !state.is_visible() {
            tracing::debug!("acknowledgement with no popup visible");
            return Vec::new();
        }

        let missed_secs = self.tracker.on_acknowledge(&mut self.timers);
        let outcome = AckOutcome::classify(state, missed_secs);
        let message = match outcome {
            AckOutcome::Late => format!("Popup clicked after {}", format_elapsed(missed_secs)),
            AckOutcome::Prompt => "I'm Here".to_string(),
        };
        record(self.log.as_mut(), now, outcome.category(), message);
        self.scheduler.mark_idle();
        tracing::info!(?outcome, missed_secs, "popup acknowledged");

        let mut events = vec![Event::PopupAcknowledged {
            outcome,
            missed_secs,
            session_count: self.scheduler.session_count(),
            at: now,
        }];
        if !self.scheduler.is_exhausted() {
            events.extend(self.schedule_next(now));
        }
        events
    }
}
