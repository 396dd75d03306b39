//! Named-event notification bus.
//!
//! Any component can fire a named [`Notification`] carrying its source and an
//! optional payload. Every listener receives every notification and filters by
//! name. The undo manager announces its state transitions here so UI layers can
//! refresh undo/redo affordances, and gameplay code uses it for loosely coupled
//! reactions.
//!
//! The bus is an explicitly constructed service: clone it into the components
//! that publish, and call [`NotificationBus::subscribe`] where events are read.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Notification names emitted by the undo manager.
pub mod names {
    pub const KEPT: &str = "kept";
    pub const OPENED: &str = "opened";
    pub const UNDO: &str = "undo";
    pub const REDO: &str = "redo";
    pub const CLEARED: &str = "cleared";
    pub const ACTIVATED: &str = "activated";
    pub const DEACTIVATED: &str = "deactivated";
}

/// A named event fired on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Label of the component that fired the event.
    pub source: String,
    /// Event name listeners filter on.
    pub name: Cow<'static, str>,
    /// Optional event payload (e.g. the label of a captured object).
    pub payload: Option<serde_json::Value>,
}

impl Notification {
    pub fn new(source: impl Into<String>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Returns true if this notification carries the given name.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

/// Publish/subscribe channel shared by every component of a session.
#[derive(Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    /// Creates a bus with the default per-listener backlog.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a bus buffering up to `capacity` undelivered notifications per listener.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a notification to every current listener.
    pub fn publish(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            // No listeners - this is normal, not an error
            tracing::trace!(target: "game_core::notify", "notification dropped, no listeners");
        }
    }

    /// Convenience for firing a payload-less notification.
    pub fn fire(&self, source: impl Into<String>, name: impl Into<Cow<'static, str>>) {
        self.publish(Notification::new(source, name));
    }

    /// Registers a new listener. It receives every notification published from now on.
    pub fn subscribe(&self) -> Listener {
        Listener {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a [`NotificationBus`].
pub struct Listener {
    receiver: broadcast::Receiver<Notification>,
}

impl Listener {
    /// Returns the next buffered notification without waiting.
    ///
    /// Notifications lost to lag are skipped with a warning.
    pub fn try_next(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.try_recv() {
                Ok(notification) => return Some(notification),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(target: "game_core::notify", skipped, "listener lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the next notification. Returns `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) => return Some(notification),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(target: "game_core::notify", skipped, "listener lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Drains every buffered notification.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Drains buffered notifications, keeping only those with `name`.
    pub fn drain_named(&mut self, name: &str) -> Vec<Notification> {
        self.drain().into_iter().filter(|n| n.is(name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_receive_every_notification() {
        let bus = NotificationBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.fire("map", "unit_selected");
        bus.publish(Notification::new("undo_manager", names::KEPT).with_payload("unit:A".into()));

        let received: Vec<_> = first.drain().into_iter().map(|n| n.name).collect();
        assert_eq!(received, vec!["unit_selected", names::KEPT]);

        let kept = second.drain_named(names::KEPT);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].payload, Some(serde_json::json!("unit:A")));
    }

    #[test]
    fn publishing_without_listeners_is_harmless() {
        let bus = NotificationBus::with_capacity(4);
        bus.fire("nobody", "listening");
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn lagging_listener_skips_lost_notifications() {
        let bus = NotificationBus::with_capacity(2);
        let mut listener = bus.subscribe();
        for i in 0..5 {
            bus.fire(format!("src{i}"), "tick");
        }
        let received = listener.drain();
        assert_eq!(received.len(), 2);
        assert_eq!(received[1].source, "src4");
    }
}
