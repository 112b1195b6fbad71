//! Check-in popup state machine.
//!
//! - [`WindowPicker`] draws a trigger instant inside the daily window.
//! - [`PopupScheduler`] arms it, counts popups and enforces the cap.
//! - [`MissedTimeTracker`] runs the grace period and then the missed-time
//!   counter.
//! - [`CheckinEngine::acknowledge`] closes a popup and loops back to
//!   scheduling.

mod ack;
mod engine;
mod missed;
mod picker;
mod scheduler;

pub use ack::AckOutcome;
pub use engine::{
    CheckinEngine, CheckinPolicy, ConfirmationPrompt, DEFAULT_GRACE_PERIOD_SECS,
    DEFAULT_POPUPS_PER_SESSION, MAX_GRACE_PERIOD_SECS,
};
pub use missed::{MissedTimeTracker, MISSED_TICK_SECS};
pub use picker::{RandomSource, WindowPicker};
pub use scheduler::{FiredPopup, PopupScheduler, PopupState, ScheduleOutcome, ScheduledTrigger};
