//! Desktop notification seam.
//!
//! The engine asks a [`Notifier`] to announce each popup. Delivery is best
//! effort: a notifier that is missing, denied or failing never delays the
//! popup or the log.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// Title of the popup notification.
pub const NOTIFICATION_TITLE: &str = "Work Check In";
/// Body of the popup notification.
pub const NOTIFICATION_BODY: &str = "A random popup appeared!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// Not decided yet; treated as not granted.
    Default,
}

impl NotificationPermission {
    pub fn is_granted(&self) -> bool {
        matches!(self, NotificationPermission::Granted)
    }
}

impl fmt::Display for NotificationPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationPermission::Granted => "granted",
            NotificationPermission::Denied => "denied",
            NotificationPermission::Default => "default",
        })
    }
}

pub trait Notifier: Send {
    /// Resolve the permission state, prompting if the backend supports it.
    fn request_permission(&mut self) -> NotificationPermission;

    fn send(&mut self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Notifier that never delivers anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn request_permission(&mut self) -> NotificationPermission {
        NotificationPermission::Denied
    }

    fn send(&mut self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Unavailable)
    }
}

/// Send through `notifier` if permitted, swallowing failures.
pub(crate) fn deliver(
    notifier: &mut dyn Notifier,
    permission: NotificationPermission,
    title: &str,
    body: &str,
) {
    if !permission.is_granted() {
        tracing::debug!(%permission, "notification skipped");
        return;
    }
    if let Err(e) = notifier.send(title, body) {
        tracing::warn!(error = %e, "notification failed");
    }
}
