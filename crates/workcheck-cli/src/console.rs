//! Terminal-side implementations of the engine's log and notifier seams.

use std::io::Write;

use notify_rust::Notification;
use workcheck_core::{
    LogEvent, LogSink, MemoryLog, NotificationPermission, Notifier, NotifyError,
};

/// Prints every log line as `HH:MM:SS: message` and keeps a copy in memory.
pub struct ConsoleLog {
    history: MemoryLog,
}

impl ConsoleLog {
    pub fn new(history: MemoryLog) -> Self {
        Self { history }
    }
}

impl LogSink for ConsoleLog {
    fn append(&mut self, event: LogEvent) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{event}");
        let _ = stdout.flush();
        self.history.append(event);
    }
}

/// Desktop notifications through the platform notification service.
pub struct DesktopNotifier {
    enabled: bool,
}

impl DesktopNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Notifier for DesktopNotifier {
    fn request_permission(&mut self) -> NotificationPermission {
        if self.enabled {
            NotificationPermission::Granted
        } else {
            NotificationPermission::Denied
        }
    }

    fn send(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
        if !self.enabled {
            return Err(NotifyError::NotPermitted);
        }
        Notification::new()
            .summary(title)
            .body(body)
            .appname("workcheck")
            .icon("alarm-clock")
            .show()
            .map_err(|e| NotifyError::CommandFailed {
                command: "notify-rust".to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}
