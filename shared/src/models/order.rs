//! Order Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, ErrorCode};

/// Default estimated preparation time in minutes
pub const DEFAULT_ESTIMATED_MINUTES: u32 = 15;

/// Order lifecycle status
///
/// Transitions are caller-directed; any status may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::OrderStatusInvalid,
                    format!("Invalid order status: {s}"),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    #[default]
    Whatsapp,
    Sms,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Sent,
    Delivered,
    Failed,
}

/// Line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    /// At least 1
    pub quantity: u32,
    /// Unit price in currency unit, never negative
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One entry of the append-only notification history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    #[serde(rename = "type")]
    pub channel: NotificationChannel,
    pub sent_at: i64,
    pub status: DeliveryStatus,
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Internal storage id
    pub id: String,
    /// Externally visible id, unique across the system
    pub order_id: String,
    /// Owning account id
    pub restaurant_id: String,
    pub customer_name: String,
    pub phone_number: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub estimated_time: u32,
    pub ready_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub notification_sent: bool,
    pub notification_history: Vec<NotificationRecord>,
    pub notes: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Result of applying a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    /// The order entered `ready` with this change (stamp + notify)
    pub became_ready: bool,
}

impl Order {
    /// Build a fresh `pending` order from a validated create payload
    pub fn new(id: String, restaurant_id: String, create: OrderCreate, now: i64) -> Self {
        Self {
            id,
            order_id: create.order_id.unwrap_or_default().trim().to_string(),
            restaurant_id,
            customer_name: create.customer_name.unwrap_or_default().trim().to_string(),
            phone_number: create.phone_number.unwrap_or_default().trim().to_string(),
            status: OrderStatus::Pending,
            items: create.items.unwrap_or_default(),
            total_amount: create.total_amount.unwrap_or(0.0),
            estimated_time: create.estimated_time.unwrap_or(DEFAULT_ESTIMATED_MINUTES),
            ready_at: None,
            completed_at: None,
            notification_sent: false,
            notification_history: Vec::new(),
            notes: create.notes,
            priority: create.priority.unwrap_or_default(),
            tags: create.tags.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Assign a new status and stamp the matching timestamp
    ///
    /// Entering `ready` stamps `ready_at` and sets `notification_sent`;
    /// re-setting `ready` on an order that is already ready changes nothing.
    /// Entering `completed` stamps `completed_at`.
    pub fn apply_status(&mut self, status: OrderStatus, now: i64) -> StatusTransition {
        let old_status = self.status;
        let stamp = now.max(self.created_at);
        let mut became_ready = false;

        self.status = status;
        self.updated_at = stamp;

        match status {
            OrderStatus::Ready if old_status != OrderStatus::Ready => {
                self.ready_at = Some(stamp);
                self.notification_sent = true;
                became_ready = true;
            }
            OrderStatus::Completed if old_status != OrderStatus::Completed => {
                self.completed_at = Some(stamp);
            }
            _ => {}
        }

        StatusTransition {
            old_status,
            new_status: status,
            became_ready,
        }
    }

    /// Apply a field edit; status and timestamps are untouched
    pub fn apply_update(&mut self, update: OrderUpdate, now: i64) {
        if let Some(v) = update.customer_name {
            self.customer_name = v.trim().to_string();
        }
        if let Some(v) = update.phone_number {
            self.phone_number = v.trim().to_string();
        }
        if let Some(v) = update.items {
            self.items = v;
        }
        if let Some(v) = update.total_amount {
            self.total_amount = v;
        }
        if let Some(v) = update.estimated_time {
            self.estimated_time = v;
        }
        if let Some(v) = update.notes {
            self.notes = Some(v);
        }
        if let Some(v) = update.priority {
            self.priority = v;
        }
        if let Some(v) = update.tags {
            self.tags = v;
        }
        self.updated_at = now.max(self.created_at);
    }

    /// Append a delivery attempt; `notification_sent` stays owned by `apply_status`
    pub fn add_notification(&mut self, record: NotificationRecord) {
        self.notification_history.push(record);
    }

    /// Minutes since creation
    pub fn age_minutes(&self, now: i64) -> i64 {
        crate::util::minutes_between(self.created_at, now)
    }

    /// Minutes since the order became ready
    pub fn minutes_since_ready(&self, now: i64) -> Option<i64> {
        self.ready_at
            .map(|ready_at| crate::util::minutes_between(ready_at, now))
    }
}

/// Create order payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub order_id: Option<String>,
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
    pub items: Option<Vec<OrderItem>>,
    pub total_amount: Option<f64>,
    pub estimated_time: Option<u32>,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
}

impl OrderCreate {
    pub fn validate(&self) -> Result<(), AppError> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !present(&self.order_id) || !present(&self.customer_name) || !present(&self.phone_number)
        {
            return Err(AppError::with_message(
                ErrorCode::RequiredField,
                "Order ID, customer name, and phone number are required.",
            ));
        }
        validate_amounts(self.items.as_deref(), self.total_amount)
    }
}

/// Update order payload (only the editable fields)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
    pub items: Option<Vec<OrderItem>>,
    pub total_amount: Option<f64>,
    pub estimated_time: Option<u32>,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
}

impl OrderUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
        if blank(&self.customer_name) || blank(&self.phone_number) {
            return Err(AppError::validation(
                "Customer name and phone number cannot be empty.",
            ));
        }
        validate_amounts(self.items.as_deref(), self.total_amount)
    }
}

fn validate_amounts(items: Option<&[OrderItem]>, total: Option<f64>) -> Result<(), AppError> {
    for item in items.unwrap_or_default() {
        if item.name.trim().is_empty() {
            return Err(AppError::with_message(
                ErrorCode::OrderItemInvalid,
                "Item name is required.",
            ));
        }
        if item.quantity < 1 {
            return Err(AppError::with_message(
                ErrorCode::OrderItemInvalid,
                format!("Item '{}' must have a quantity of at least 1.", item.name),
            ));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(AppError::with_message(
                ErrorCode::OrderItemInvalid,
                format!("Item '{}' has an invalid price.", item.name),
            ));
        }
    }
    if let Some(total) = total
        && (!total.is_finite() || total < 0.0)
    {
        return Err(AppError::validation("Total amount must not be negative."));
    }
    Ok(())
}

/// Order as rendered to clients, with derived ages
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    /// Minutes since creation
    pub age: i64,
    /// Minutes since ready, null if never ready
    pub time_since_ready: Option<i64>,
}

impl OrderView {
    pub fn at(order: Order, now: i64) -> Self {
        Self {
            age: order.age_minutes(now),
            time_since_ready: order.minutes_since_ready(now),
            order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(order_id: &str) -> OrderCreate {
        OrderCreate {
            order_id: Some(order_id.into()),
            customer_name: Some("Ana".into()),
            phone_number: Some("+15551234567".into()),
            items: Some(vec![OrderItem {
                name: "Burger".into(),
                quantity: 2,
                price: 8.5,
                notes: None,
            }]),
            total_amount: Some(17.0),
            ..Default::default()
        }
    }

    #[test]
    fn new_order_defaults() {
        let order = Order::new("o1".into(), "acc".into(), create("A100"), 1_000);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.estimated_time, DEFAULT_ESTIMATED_MINUTES);
        assert!(!order.notification_sent);
        assert!(order.notification_history.is_empty());
        assert_eq!(order.priority, Priority::Normal);
    }

    #[test]
    fn ready_stamps_once() {
        let mut order = Order::new("o1".into(), "acc".into(), create("A100"), 1_000);
        let t = order.apply_status(OrderStatus::Ready, 5_000);
        assert!(t.became_ready);
        assert_eq!(t.old_status, OrderStatus::Pending);
        assert_eq!(order.ready_at, Some(5_000));
        assert!(order.notification_sent);

        let again = order.apply_status(OrderStatus::Ready, 9_000);
        assert!(!again.became_ready);
        assert_eq!(order.ready_at, Some(5_000));
    }

    #[test]
    fn ready_at_never_before_created() {
        let mut order = Order::new("o1".into(), "acc".into(), create("A100"), 10_000);
        order.apply_status(OrderStatus::Ready, 2_000);
        assert!(order.ready_at.unwrap() >= order.created_at);
    }

    #[test]
    fn completed_without_ready_is_allowed() {
        let mut order = Order::new("o1".into(), "acc".into(), create("A100"), 1_000);
        order.apply_status(OrderStatus::Completed, 3_000);
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.completed_at, Some(3_000));
        assert_eq!(order.ready_at, None);
    }

    #[test]
    fn status_parse() {
        assert_eq!("ready".parse::<OrderStatus>().unwrap(), OrderStatus::Ready);
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderStatusInvalid);
    }

    #[test]
    fn create_requires_fields() {
        let mut payload = create("A1");
        payload.customer_name = Some("  ".into());
        assert_eq!(payload.validate().unwrap_err().code, ErrorCode::RequiredField);
    }

    #[test]
    fn create_rejects_bad_items() {
        let mut payload = create("A1");
        payload.items = Some(vec![OrderItem {
            name: "Fries".into(),
            quantity: 0,
            price: 2.0,
            notes: None,
        }]);
        assert_eq!(payload.validate().unwrap_err().code, ErrorCode::OrderItemInvalid);

        let mut payload = create("A1");
        payload.total_amount = Some(-1.0);
        assert_eq!(payload.validate().unwrap_err().code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn view_ages() {
        let mut order = Order::new("o1".into(), "acc".into(), create("A100"), 0);
        order.apply_status(OrderStatus::Ready, 60_000);
        let view = OrderView::at(order, 5 * 60_000);
        assert_eq!(view.age, 5);
        assert_eq!(view.time_since_ready, Some(4));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["orderId"], "A100");
        assert_eq!(json["timeSinceReady"], 4);
    }

    #[test]
    fn history_does_not_mark_pending_as_notified() {
        let mut order = Order::new("o1".into(), "acc".into(), create("A1"), 0);
        order.add_notification(NotificationRecord {
            channel: NotificationChannel::Whatsapp,
            sent_at: 1,
            status: DeliveryStatus::Sent,
            message: Some("Kitchen closing soon".into()),
            error: None,
        });
        assert_eq!(order.notification_history.len(), 1);
        assert!(!order.notification_sent);
    }

    #[test]
    fn notification_record_uses_type_key() {
        let record = NotificationRecord {
            channel: NotificationChannel::Whatsapp,
            sent_at: 1,
            status: DeliveryStatus::Failed,
            message: Some("hi".into()),
            error: Some("boom".into()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "whatsapp");
        assert_eq!(json["status"], "failed");
    }
}
