//! User notifications.
//!
//! Deferred work reports back to the requesting user out-of-band: a note when
//! the job is queued, a sticky note when it finishes, an error note when it
//! fails. Delivery is fire-and-forget; losing a notification never fails the
//! job that produced it.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use stockrecon_core::UserId;

/// Severity of a notification, mapped to the display style on the client.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// A message addressed to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub message: String,
    /// Sticky notifications stay on screen until dismissed.
    pub sticky: bool,
    pub sent_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient: UserId,
        kind: NotificationKind,
        message: impl Into<String>,
        sticky: bool,
    ) -> Self {
        Self {
            recipient,
            kind,
            message: message.into(),
            sticky,
            sent_at: Utc::now(),
        }
    }
}

/// Delivery channel for user notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn info(&self, recipient: UserId, message: impl Into<String>, sticky: bool) {
        self.notify(Notification::new(
            recipient,
            NotificationKind::Info,
            message,
            sticky,
        ));
    }

    fn success(&self, recipient: UserId, message: impl Into<String>, sticky: bool) {
        self.notify(Notification::new(
            recipient,
            NotificationKind::Success,
            message,
            sticky,
        ));
    }

    fn error(&self, recipient: UserId, message: impl Into<String>, sticky: bool) {
        self.notify(Notification::new(
            recipient,
            NotificationKind::Error,
            message,
            sticky,
        ));
    }
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// In-memory notifier for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    sent: RwLock<Vec<Notification>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Everything delivered so far, in send order.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.read().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl Notifier for InMemoryNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut sent) = self.sent.write() {
            sent.push(notification);
        }
    }
}

/// Notifier that writes to the tracing log instead of a user channel.
///
/// Useful for headless deployments where no client bus is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Info | NotificationKind::Success => info!(
                recipient = %notification.recipient,
                kind = ?notification.kind,
                sticky = notification.sticky,
                "{}",
                notification.message
            ),
            NotificationKind::Error => error!(
                recipient = %notification.recipient,
                sticky = notification.sticky,
                "{}",
                notification.message
            ),
        }
    }
}
