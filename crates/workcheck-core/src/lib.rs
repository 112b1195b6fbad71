//! # workcheck Core Library
//!
//! This library provides the core logic for the workcheck reminder: within a
//! daily time window it shows a fixed number of randomly timed "are you
//! there?" popups and, when one is not acknowledged within a grace period,
//! counts the missed time until it is. The `workcheck` CLI is a thin
//! terminal front end over the same library.
//!
//! ## Architecture
//!
//! - **Check-in Engine**: An event-driven state machine that never sleeps;
//!   the caller passes in wall-clock instants and drains due timers
//! - **Timer Queue**: Cancellable one-shot and recurring timers, one per slot
//! - **Log Sink / Notifier**: Seams for the user-facing log and desktop
//!   notifications
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`CheckinEngine`]: Session state machine
//! - [`WindowPicker`]: Random trigger instant inside a window
//! - [`TimerQueue`]: Cancellable timer handles
//! - [`Config`]: Application configuration management

pub mod checkin;
pub mod error;
pub mod events;
pub mod log;
pub mod notify;
pub mod storage;
pub mod timer;
pub mod window;

pub use checkin::{
    AckOutcome, CheckinEngine, CheckinPolicy, ConfirmationPrompt, PopupState, RandomSource,
    WindowPicker,
};
pub use error::{ConfigError, CoreError, NotifyError, ValidationError};
pub use events::Event;
pub use log::{LogCategory, LogEvent, LogSink, MemoryLog};
pub use notify::{NotificationPermission, Notifier, NullNotifier};
pub use storage::Config;
pub use timer::{TimerHandle, TimerQueue, TimerSlot};
pub use window::{TimeOfDay, TimeWindow};
