//! RoomHub: per-restaurant real-time fan-out
//!
//! ```text
//! order handlers ──publish(restaurant_id, ServerEvent)──▶ RoomHub
//!   └── rooms: restaurant_id → broadcast::Sender<RoomMessage>
//!             │
//!             ▼
//!        WS sessions (subscribe → forward, skipping their own relays)
//! ```
//!
//! Delivery is best-effort: no replay for late joiners, lagging receivers skip.

use dashmap::DashMap;
use shared::live::ServerEvent;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast channel capacity per room
const ROOM_CAPACITY: usize = 256;

/// Event in a room, tagged with the connection that relayed it (if any)
#[derive(Debug, Clone)]
pub struct RoomMessage {
    pub event: ServerEvent,
    /// Set for client relays so the sender is not echoed
    pub origin: Option<u64>,
}

#[derive(Clone, Default)]
pub struct RoomHub {
    /// restaurant_id → room sender
    rooms: Arc<DashMap<String, broadcast::Sender<RoomMessage>>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, restaurant_id: &str) -> broadcast::Sender<RoomMessage> {
        self.rooms
            .entry(restaurant_id.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .clone()
    }

    /// Join a restaurant's room
    pub fn subscribe(&self, restaurant_id: &str) -> broadcast::Receiver<RoomMessage> {
        self.sender(restaurant_id).subscribe()
    }

    /// Publish a server event to everyone currently in the room
    pub fn publish(&self, restaurant_id: &str, event: ServerEvent) -> usize {
        self.send(restaurant_id, RoomMessage { event, origin: None })
    }

    /// Re-publish a client frame to the rest of the room
    pub fn relay(&self, restaurant_id: &str, origin: u64, event: ServerEvent) -> usize {
        self.send(
            restaurant_id,
            RoomMessage {
                event,
                origin: Some(origin),
            },
        )
    }

    fn send(&self, restaurant_id: &str, message: RoomMessage) -> usize {
        let Some(tx) = self.rooms.get(restaurant_id).map(|tx| tx.clone()) else {
            return 0;
        };
        // No subscribers: send returns Err, nothing to deliver
        let delivered = tx.send(message).unwrap_or(0);
        tracing::debug!(restaurant_id = %restaurant_id, receivers = delivered, "Room event published");
        delivered
    }

    /// Drop rooms nobody listens to
    pub fn prune(&self) {
        self.rooms.retain(|_, tx| tx.receiver_count() > 0);
    }
}
