//! Operator notifications
//!
//! Every service operation ends in a short Portuguese message for the
//! operator. Failures are reported here and not returned to the caller.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Error with the generic "Erro" title
    pub fn error(description: impl Into<String>) -> Self {
        Self::error_titled("Erro", description)
    }

    pub fn error_titled(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.level {
            NotificationLevel::Success => {
                tracing::info!(title = %n.title, "{}", n.description)
            }
            NotificationLevel::Error => {
                tracing::error!(title = %n.title, "{}", n.description)
            }
        }
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    recorded: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.recorded.lock().clone()
    }

    pub fn errors(&self) -> Vec<Notification> {
        self.recorded
            .lock()
            .iter()
            .filter(|n| n.is_error())
            .cloned()
            .collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.recorded.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.recorded.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        tracing::debug!(?notification, "Recorded notification");
        self.recorded.lock().push(notification);
    }
}
