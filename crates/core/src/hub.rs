//! Event hub: subscriber registry and broadcast
//!
//! The app publishes `AppEvent`s here after it mutates state; renderers and
//! notification sinks subscribe and react. Data only flows one way.

use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::notifications::Notification;

/// Events emitted by the app
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Collections or filter state changed; views should redraw
    StateChanged,
    /// Transient message for the user
    Notification(Notification),
}

/// Hub for fanning events out to subscribers
///
/// A subscriber leaves by dropping its receiver; the next publish forgets it.
#[derive(Clone, Default)]
pub struct Hub {
    subscribers: Arc<Mutex<Vec<Sender<AppEvent>>>>,
}

impl Hub {
    /// Create a new hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and get its receiving end
    pub fn subscribe(&self) -> Receiver<AppEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner).push(tx);
        rx
    }

    /// Broadcast an event to all subscribers
    ///
    /// Subscribers whose receiver was dropped are removed.
    pub fn publish(&self, event: AppEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
    }

    /// Shorthand for publishing a notification
    pub fn notify(&self, notification: Notification) {
        self.publish(AppEvent::Notification(notification));
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
