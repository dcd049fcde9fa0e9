//! Fan-out of toolpin events.
//!
//! The tracing layer writes into an unbounded mpsc channel, so emitting an
//! event never blocks an install task. A forwarding task copies each event
//! onto a broadcast channel that renderers subscribe to. The bus lives for
//! one command; once every sender is dropped the receivers drain and end.

use crate::event::ToolpinEvent;
use tokio::sync::{broadcast, mpsc};

const DEFAULT_CAPACITY: usize = 1024;

/// One-command event bus.
#[derive(Debug)]
pub struct EventBus {
    input: mpsc::UnboundedSender<ToolpinEvent>,
    output: broadcast::Sender<ToolpinEvent>,
}

impl EventBus {
    /// Create a bus and its forwarding task. Must be called inside a tokio
    /// runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Like [`EventBus::new`], buffering at most `capacity` events per slow
    /// subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (input, receiver) = mpsc::unbounded_channel();
        let (output, _) = broadcast::channel(capacity);
        tokio::spawn(forward(receiver, output.clone()));
        Self { input, output }
    }

    /// A handle for submitting events.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            inner: self.input.clone(),
        }
    }

    /// Subscribe to events forwarded after this call.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            inner: self.output.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

async fn forward(
    mut input: mpsc::UnboundedReceiver<ToolpinEvent>,
    output: broadcast::Sender<ToolpinEvent>,
) {
    while let Some(event) = input.recv().await {
        // Fails only when nobody is subscribed.
        let _ = output.send(event);
    }
}

/// Sender half of an [`EventBus`].
#[derive(Debug, Clone)]
pub struct EventSender {
    inner: mpsc::UnboundedSender<ToolpinEvent>,
}

impl EventSender {
    /// The raw channel, for [`crate::ToolpinEventLayer::new`].
    #[must_use]
    pub fn into_inner(self) -> mpsc::UnboundedSender<ToolpinEvent> {
        self.inner
    }

    /// Submit an event.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Closed`] once the forwarding task has stopped.
    pub fn send(&self, event: ToolpinEvent) -> Result<(), SendError> {
        self.inner.send(event).map_err(|_| SendError::Closed)
    }
}

/// Subscriber half of an [`EventBus`].
#[derive(Debug)]
pub struct EventReceiver {
    inner: broadcast::Receiver<ToolpinEvent>,
}

impl EventReceiver {
    /// The next event, or `None` once every sender is gone and the buffer
    /// is drained. A receiver that falls behind skips the oldest events.
    pub async fn recv(&mut self) -> Option<ToolpinEvent> {
        loop {
            match self.inner.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Error returned when sending to a closed bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The forwarding task has stopped.
    #[error("event bus is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventCategory, EventSource, ToolEvent};
    use uuid::Uuid;

    fn queued(name: &str) -> ToolpinEvent {
        ToolpinEvent::new(
            Uuid::new_v4(),
            EventSource::new("toolpin::tool"),
            EventCategory::Tool(ToolEvent::Queued {
                name: name.to_string(),
                version: "1.0.0".to_string(),
            }),
        )
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_events_in_order() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let events = [queued("elm"), queued("elm-format"), queued("elm-json")];
        let ids: Vec<_> = events.iter().map(|e| e.id).collect();
        for event in events {
            sender.send(event).unwrap();
        }

        for receiver in [&mut first, &mut second] {
            for id in &ids {
                assert_eq!(receiver.recv().await.unwrap().id, *id);
            }
        }
    }

    #[tokio::test]
    async fn test_receiver_drains_then_ends_when_senders_drop() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let mut receiver = bus.subscribe();

        let event = queued("elm");
        let id = event.id;
        sender.send(event).unwrap();
        drop(sender);
        drop(bus);

        assert_eq!(receiver.recv().await.unwrap().id, id);
        assert!(receiver.recv().await.is_none());
    }

    #[test]
    fn test_send_error_display() {
        assert_eq!(SendError::Closed.to_string(), "event bus is closed");
    }
}
