//! Shared application state and the broadcasting display slot.
//!
//! [`BroadcastSlot`] is the display slot the updater writes to when the
//! greeting is rendered in browsers. It keeps the current
//! [`SlotSnapshot`] for REST reads and publishes a [`SlotUpdate`] on a
//! broadcast channel after every mutation for `WebSocket` clients.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use greeting_core::DisplaySlot;
use greeting_types::{SlotMutation, SlotSnapshot, SlotUpdate};
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for slot updates.
///
/// A subscriber that falls more than this many messages behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest update.
const BROADCAST_CAPACITY: usize = 64;

/// Display slot that publishes every mutation.
#[derive(Debug)]
pub struct BroadcastSlot {
    id: String,
    snapshot: Mutex<SlotSnapshot>,
    tx: broadcast::Sender<SlotUpdate>,
}

impl BroadcastSlot {
    /// Create an empty, visible slot.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            snapshot: Mutex::new(SlotSnapshot::new(id.clone())),
            id,
            tx,
        }
    }

    /// Subscribe to slot updates.
    pub fn subscribe(&self) -> broadcast::Receiver<SlotUpdate> {
        self.tx.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, SlotSnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DisplaySlot for BroadcastSlot {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, mutation: SlotMutation) {
        let mut snapshot = self.lock();
        snapshot.apply(&mutation, Utc::now());
        let update = SlotUpdate {
            mutation,
            snapshot: snapshot.clone(),
        };
        // Published under the lock so subscribers see updates in the order
        // they were applied. `send` fails only when nobody is subscribed.
        let _ = self.tx.send(update);
    }

    fn snapshot(&self) -> SlotSnapshot {
        self.lock().clone()
    }
}

/// Shared state for the Axum application.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The slot rendered by the page.
    pub slot: Arc<BroadcastSlot>,
    /// When the observer state was created.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state around an existing slot.
    pub fn new(slot: Arc<BroadcastSlot>) -> Self {
        Self {
            slot,
            started_at: Utc::now(),
        }
    }

    /// Subscribe to slot updates.
    pub fn subscribe(&self) -> broadcast::Receiver<SlotUpdate> {
        self.slot.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use greeting_types::{SlotStyle, TransitionId};

    use super::*;

    #[tokio::test]
    async fn mutations_are_broadcast_in_order() {
        let slot = BroadcastSlot::new("greeting");
        let mut rx = slot.subscribe();
        let id = TransitionId::new();

        slot.apply(SlotMutation::hide(id, SlotStyle::hidden(10)));
        slot.apply(SlotMutation::reveal(
            id,
            String::from("Good afternoon, IT Department!"),
            SlotStyle::VISIBLE,
        ));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.snapshot.revision, 1);
        assert_eq!(first.snapshot.style.opacity, 0);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.snapshot.revision, 2);
        assert_eq!(second.snapshot.text, "Good afternoon, IT Department!");
        assert_eq!(second.mutation.transition, id);
    }

    #[test]
    fn apply_without_subscribers_updates_snapshot() {
        let slot = BroadcastSlot::new("greeting");
        slot.apply(SlotMutation::hide(TransitionId::new(), SlotStyle::hidden(10)));
        assert_eq!(slot.snapshot().revision, 1);
        assert_eq!(slot.id(), "greeting");
    }
}
