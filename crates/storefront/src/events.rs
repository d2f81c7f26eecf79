//! Cart change notifications.
//!
//! A broadcast channel decouples cart mutations from the UI elements
//! that react to them (header badge, mini-cart). Exactly one event is
//! published per successful mutation: guest mutations publish from the
//! guest store, remote mutations from the facade.

use tokio::sync::broadcast;

/// Default channel capacity; badge updates are tiny and lossy-safe.
const CHANNEL_CAPACITY: usize = 16;

/// A cart change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEvent {
    /// The cart changed; carries the new total unit count.
    Updated { item_count: u32 },
    /// The cart was emptied (checkout or explicit clear).
    Cleared,
}

/// Publish/subscribe channel for cart events.
///
/// Cloning shares the underlying channel. Publishing with no subscribers
/// is a no-op, not an error.
#[derive(Debug, Clone)]
pub struct CartEvents {
    tx: broadcast::Sender<CartEvent>,
}

impl CartEvents {
    /// Create a new event channel.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to cart events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: CartEvent) {
        // send only fails when there are no receivers - fine for badges
        let _ = self.tx.send(event);
    }
}

impl Default for CartEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let events = CartEvents::new();
        events.publish(CartEvent::Cleared);
    }

    #[test]
    fn test_subscribers_receive_events() {
        let events = CartEvents::new();
        let mut rx = events.subscribe();

        events.publish(CartEvent::Updated { item_count: 3 });
        events.publish(CartEvent::Cleared);

        assert_eq!(rx.try_recv().unwrap(), CartEvent::Updated { item_count: 3 });
        assert_eq!(rx.try_recv().unwrap(), CartEvent::Cleared);
    }

    #[test]
    fn test_clones_share_the_channel() {
        let events = CartEvents::new();
        let clone = events.clone();
        let mut rx = events.subscribe();

        clone.publish(CartEvent::Updated { item_count: 1 });
        assert_eq!(rx.try_recv().unwrap(), CartEvent::Updated { item_count: 1 });
    }
}
