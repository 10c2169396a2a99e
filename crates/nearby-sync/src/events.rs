// Event Emitter - single fan-out point for consumer-visible events

use crate::NearbyEvent;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

/// Publishes normalized lifecycle events to at most one subscriber.
///
/// Events are transient: with no subscriber attached, `publish` drops the
/// event. There is no buffering and no replay for a late subscriber.
pub struct EventEmitter {
    subscriber: Arc<RwLock<Option<mpsc::UnboundedSender<NearbyEvent>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            subscriber: Arc::new(RwLock::new(None)),
        }
    }

    /// Attach a subscriber, replacing any previous one.
    ///
    /// The previous subscriber's receiver simply stops seeing events.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<NearbyEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscriber = self.subscriber.write().await;
        if subscriber.is_some() {
            warn!("Replacing existing event subscriber");
        }
        *subscriber = Some(tx);
        rx
    }

    /// Detach the current subscriber, if any
    pub async fn unsubscribe(&self) {
        let mut subscriber = self.subscriber.write().await;
        if subscriber.take().is_some() {
            debug!("Event subscriber detached");
        }
    }

    pub async fn has_subscriber(&self) -> bool {
        self.subscriber.read().await.is_some()
    }

    /// Publish an event to the subscriber; a no-op when nobody listens
    pub async fn publish(&self, event: NearbyEvent) {
        let subscriber = self.subscriber.read().await;
        match subscriber.as_ref() {
            Some(tx) => {
                if tx.send(event).is_err() {
                    // Receiver was dropped without unsubscribing; treat it
                    // the same as having no subscriber.
                    debug!("Event subscriber gone, dropping event");
                }
            }
            None => {
                debug!("No event subscriber attached, dropping event");
            }
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscriber_is_noop() {
        let emitter = EventEmitter::new();
        assert!(!emitter.has_subscriber().await);

        // Must not panic or block
        emitter
            .publish(NearbyEvent::DeviceLost {
                device_id: "ep1".to_string(),
            })
            .await;
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let emitter = EventEmitter::new();
        let mut rx = emitter.subscribe().await;

        emitter
            .publish(NearbyEvent::DeviceFound {
                device_id: "ep1".to_string(),
                device_name: "Alice".to_string(),
                unique_id: "ep1".to_string(),
                is_remote_device: true,
            })
            .await;
        emitter
            .publish(NearbyEvent::DeviceLost {
                device_id: "ep1".to_string(),
            })
            .await;

        assert!(matches!(
            rx.recv().await.unwrap(),
            NearbyEvent::DeviceFound { .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            NearbyEvent::DeviceLost { .. }
        ));
    }

    #[tokio::test]
    async fn test_new_subscriber_replaces_previous() {
        let emitter = EventEmitter::new();
        let mut first = emitter.subscribe().await;
        let mut second = emitter.subscribe().await;

        emitter
            .publish(NearbyEvent::PermissionsGranted { granted: true })
            .await;

        // Only the latest subscriber sees the event
        assert!(second.recv().await.is_some());
        assert!(first.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_replay_for_late_subscriber() {
        let emitter = EventEmitter::new();

        emitter
            .publish(NearbyEvent::DeviceLost {
                device_id: "ep1".to_string(),
            })
            .await;

        let mut rx = emitter.subscribe().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_after_receiver_dropped() {
        let emitter = EventEmitter::new();
        let rx = emitter.subscribe().await;
        drop(rx);

        // Must not panic
        emitter
            .publish(NearbyEvent::DeviceLost {
                device_id: "ep1".to_string(),
            })
            .await;
    }
}
