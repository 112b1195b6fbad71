//! User-facing check-in log.
//!
//! This is the append-only stream the user reads ("Popup shown at ...",
//! "I'm Here"), not diagnostics. Every line is mirrored to `tracing` at info
//! level so diagnostics still see the full history.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Classification of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogCategory {
    Action,
    Init,
    Popup,
    PopupLate,
    PopupPrompt,
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Action => "action",
            LogCategory::Init => "init",
            LogCategory::Popup => "popup",
            LogCategory::PopupLate => "popup-late",
            LogCategory::PopupPrompt => "popup-prompt",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable line of the check-in log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub at: NaiveDateTime,
    pub message: String,
    pub category: LogCategory,
}

impl LogEvent {
    /// Wall-clock timestamp as rendered in the log (`HH:MM:SS`).
    pub fn timestamp(&self) -> String {
        format_clock(self.at)
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.timestamp(), self.message)
    }
}

/// Destination for log lines. Appending never fails.
pub trait LogSink: Send {
    fn append(&mut self, event: LogEvent);
}

/// In-memory log, most recent line first.
///
/// Clones share the same buffer, so a caller can keep a handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    lines: Arc<Mutex<VecDeque<LogEvent>>>,
    capacity: Option<usize>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` lines, dropping the oldest.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            lines: Arc::default(),
            capacity: Some(capacity),
        }
    }

    /// Snapshot of all lines, most recent first.
    pub fn entries(&self) -> Vec<LogEvent> {
        self.lock().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<LogEvent> {
        self.lock().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Messages in `category`, most recent first.
    pub fn messages_in(&self, category: LogCategory) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Most recent message in `category`.
    pub fn latest_in(&self, category: LogCategory) -> Option<String> {
        self.lock()
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.message.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<LogEvent>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for MemoryLog {
    fn append(&mut self, event: LogEvent) {
        let mut lines = self.lock();
        lines.push_front(event);
        if let Some(capacity) = self.capacity {
            lines.truncate(capacity);
        }
    }
}

/// Append a line to `sink`, mirroring it to diagnostics.
pub(crate) fn record(
    sink: &mut dyn LogSink,
    at: NaiveDateTime,
    category: LogCategory,
    message: impl Into<String>,
) {
    let message = message.into();
    tracing::info!(%category, "{message}");
    sink.append(LogEvent {
        at,
        message,
        category,
    });
}

/// `HH:MM:SS` on the 24-hour clock.
pub fn format_clock(at: NaiveDateTime) -> String {
    at.format("%H:%M:%S").to_string()
}

/// Elapsed seconds as `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_elapsed(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
