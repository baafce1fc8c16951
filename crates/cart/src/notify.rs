//! User-facing notifications (toasts).

use serde::Serialize;

/// What kind of message a notification carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Validation,
}

/// A short human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    #[must_use]
    pub fn validation(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Validation,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Sink for notifications raised by the cart.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Notifier that writes to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.kind {
            NotificationKind::Success => tracing::info!(
                title = %notification.title,
                description = %notification.description,
                "Cart notification"
            ),
            NotificationKind::Validation => tracing::warn!(
                title = %notification.title,
                description = %notification.description,
                "Cart validation"
            ),
        }
    }
}
