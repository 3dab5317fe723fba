//! WebSocket frames
//!
//! Server → Client: [`ServerEvent`] (restaurant-scoped pushes)
//! Client → Server: [`ClientEvent`] (group control + relay)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Order, OrderStatus};

/// Server → Client push
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Join acknowledged
    Joined { restaurant_id: String },

    /// Rejected client frame
    Error { message: String },

    OrderCreated {
        order: Box<Order>,
        restaurant_id: String,
    },

    OrderStatusUpdated {
        order_id: String,
        status: OrderStatus,
        old_status: OrderStatus,
        restaurant_id: String,
        ready_at: Option<i64>,
        notification_sent: bool,
    },

    /// Field edit `{order, restaurantId}`, or a relayed client payload
    OrderUpdated(Value),

    OrderDeleted {
        order_id: String,
        restaurant_id: String,
    },

    BulkOrdersUpdated {
        order_ids: Vec<String>,
        status: OrderStatus,
        restaurant_id: String,
        updated_count: usize,
    },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Joined { .. } => "joined",
            ServerEvent::Error { .. } => "error",
            ServerEvent::OrderCreated { .. } => "order-created",
            ServerEvent::OrderStatusUpdated { .. } => "order-status-updated",
            ServerEvent::OrderUpdated(_) => "order-updated",
            ServerEvent::OrderDeleted { .. } => "order-deleted",
            ServerEvent::BulkOrdersUpdated { .. } => "bulk-orders-updated",
        }
    }
}

/// Client → Server command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Join the group of a restaurant (data: restaurant id)
    JoinRestaurant(String),
    /// Re-published to the rest of the group as `order-updated`
    OrderStatusUpdate(Value),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_event_frame_shape() {
        let event = ServerEvent::OrderDeleted {
            order_id: "A100".into(),
            restaurant_id: "acc_1".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            json!({"event": "order-deleted", "data": {"orderId": "A100", "restaurantId": "acc_1"}})
        );
        assert_eq!(event.name(), "order-deleted");
    }

    #[test]
    fn bulk_event_fields_are_camel_case() {
        let event = ServerEvent::BulkOrdersUpdated {
            order_ids: vec!["A1".into()],
            status: OrderStatus::Ready,
            restaurant_id: "acc_1".into(),
            updated_count: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "bulk-orders-updated");
        assert_eq!(json["data"]["updatedCount"], 1);
        assert_eq!(json["data"]["status"], "ready");
    }

    #[test]
    fn client_join_parses() {
        let cmd: ClientEvent =
            serde_json::from_str(r#"{"event":"join-restaurant","data":"acc_1"}"#).unwrap();
        assert_eq!(cmd, ClientEvent::JoinRestaurant("acc_1".into()));

        let relay: ClientEvent = serde_json::from_str(
            r#"{"event":"order-status-update","data":{"orderId":"A1","status":"ready"}}"#,
        )
        .unwrap();
        assert!(matches!(relay, ClientEvent::OrderStatusUpdate(_)));
    }
}
