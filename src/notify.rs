//! Out-of-band user notifications.
//!
//! Background work such as transcript saves reports progress through a
//! [`Notifier`]. Delivery is best-effort: a notifier never blocks and never
//! fails the work that produced the notification.

use std::fmt;
use std::sync::Mutex;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Severity of a notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    /// Neutral progress information.
    Info,
    /// An operation finished successfully.
    Success,
    /// Something failed but will be retried.
    Warning,
    /// An operation failed for good.
    Error,
}

/// A message for the user that is not part of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Text shown to the user.
    pub message: String,
}

impl Notification {
    /// Creates an informational notification.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    /// Creates a success notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    /// Creates a warning notification.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    /// Creates an error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "saved",
            NotificationLevel::Warning => "retrying",
            NotificationLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// Sink for notifications.
pub trait Notifier: Send + Sync {
    /// Delivers a notification. Must not block.
    fn notify(&self, notification: Notification);
}

/// Notifier that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _: Notification) {}
}

/// Unbounded queue of notifications drained by the UI.
///
/// The sending half lives inside background tasks; the UI drains the
/// receiving half between prompts.
#[derive(Debug)]
pub struct NotificationQueue {
    sender: UnboundedSender<Notification>,
}

impl NotificationQueue {
    /// Creates a queue and its receiving half.
    pub fn new() -> (Self, NotificationReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, NotificationReceiver { receiver })
    }
}

impl Notifier for NotificationQueue {
    fn notify(&self, notification: Notification) {
        // Closed receiver means the UI is gone; there is nobody left to tell.
        let _ = self.sender.send(notification);
    }
}

/// Receiving half of a [`NotificationQueue`].
#[derive(Debug)]
pub struct NotificationReceiver {
    receiver: UnboundedReceiver<Notification>,
}

impl NotificationReceiver {
    /// Returns every notification queued so far without waiting.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(notification) = self.receiver.try_recv() {
            out.push(notification);
        }
        out
    }
}

/// Notifier that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn notifications(&self) -> Vec<Notification> {
        match self.notifications.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        match self.notifications.lock() {
            Ok(mut guard) => guard.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drains_in_order() {
        let (queue, mut receiver) = NotificationQueue::new();
        queue.notify(Notification::warning("first"));
        queue.notify(Notification::success("second"));
        let drained = receiver.drain();
        assert_eq!(
            drained,
            vec![Notification::warning("first"), Notification::success("second")]
        );
        assert!(receiver.drain().is_empty());
    }

    #[test]
    fn notifying_after_receiver_dropped_is_harmless() {
        let (queue, receiver) = NotificationQueue::new();
        drop(receiver);
        queue.notify(Notification::error("nobody listening"));
    }

    #[test]
    fn display_tags_level() {
        assert_eq!(
            Notification::error("Failed to save").to_string(),
            "[error] Failed to save"
        );
    }

    #[test]
    fn recorder_keeps_everything() {
        let recorder = RecordingNotifier::new();
        recorder.notify(Notification::info("a"));
        recorder.notify(Notification::info("b"));
        assert_eq!(recorder.notifications().len(), 2);
    }
}
