//! Order workflow
//!
//! Status changes are persisted before any notification goes out; a failed
//! send only adds a `failed` history entry.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::live::ServerEvent;
use shared::models::{
    Account, DEFAULT_NOTIFICATION_TEMPLATE, Order, OrderCreate, OrderStatus, OrderUpdate, OrderView,
};
use shared::util::{now_millis, prefixed_id};

use crate::auth::CurrentUser;
use crate::db::{OrderQuery, OrderSort, StoreError};
use crate::error::{ServiceError, ServiceResult};
use crate::notify::{BulkDelivery, DeliveryResult, format};
use crate::state::AppState;

/// Upper bound for `limit`
const MAX_PAGE_SIZE: u32 = 100;

/// Raw listing query (`?status=&page=&limit=&sort=`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
}

impl ListQuery {
    fn resolve(self) -> Result<OrderQuery, AppError> {
        let status = match self.status.as_deref() {
            None | Some("") | Some("all") => None,
            Some(s) => Some(s.parse::<OrderStatus>()?),
        };
        let (sort, descending) = match self.sort.as_deref() {
            None | Some("") => (OrderSort::CreatedAt, true),
            Some(key) => OrderSort::parse(key)
                .ok_or_else(|| AppError::validation(format!("Invalid sort key: {key}")))?,
        };
        Ok(OrderQuery {
            status,
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(20).clamp(1, MAX_PAGE_SIZE),
            sort,
            descending,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_orders: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(limit));
        Self {
            current_page: page,
            total_pages,
            total_orders: total,
            has_next: u64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderList {
    pub orders: Vec<OrderView>,
    pub pagination: Pagination,
}

/// Outcome of a single status change
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub order: Order,
    /// Present when the change triggered a ready notification
    pub notification: Option<DeliveryResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
    pub order_ids: Option<Vec<String>>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusOutcome {
    pub message: String,
    pub updated_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<BulkDelivery>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkNotifyRequest {
    pub order_ids: Option<Vec<String>>,
    /// Custom text; each order's status message when absent
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkNotifyOutcome {
    pub message: String,
    pub results: Vec<BulkDelivery>,
}

/// Ready-notification settings of the owning account
struct ReadyNotice {
    enabled: bool,
    template: String,
    restaurant_name: Option<String>,
}

impl ReadyNotice {
    async fn load(state: &AppState, restaurant_id: &str) -> ServiceResult<Self> {
        let account: Option<Account> = state.accounts.find_by_id(restaurant_id).await?;
        Ok(match account {
            Some(account) => Self {
                enabled: account.notifications_enabled(),
                template: account.settings.notification_template.clone(),
                restaurant_name: Some(account.restaurant_name),
            },
            None => Self {
                enabled: true,
                template: DEFAULT_NOTIFICATION_TEMPLATE.to_string(),
                restaurant_name: None,
            },
        })
    }

    fn body(&self, order: &Order) -> String {
        format::ready_message(&self.template, order, self.restaurant_name.as_deref())
    }
}

fn not_found() -> AppError {
    AppError::new(ErrorCode::OrderNotFound)
}

async fn load(state: &AppState, user: &CurrentUser, order_id: &str) -> ServiceResult<Order> {
    Ok(state
        .orders
        .get(&user.restaurant_id, order_id)
        .await?
        .ok_or_else(not_found)?)
}

pub async fn list(state: &AppState, user: &CurrentUser, query: ListQuery) -> ServiceResult<OrderList> {
    let query = query.resolve()?;
    let page = state.orders.list(&user.restaurant_id, &query).await?;
    let now = now_millis();
    Ok(OrderList {
        orders: page
            .items
            .into_iter()
            .map(|order| OrderView::at(order, now))
            .collect(),
        pagination: Pagination::new(query.page, query.limit, page.total),
    })
}

pub async fn get(state: &AppState, user: &CurrentUser, order_id: &str) -> ServiceResult<Order> {
    load(state, user, order_id).await
}

pub async fn create(state: &AppState, user: &CurrentUser, payload: OrderCreate) -> ServiceResult<Order> {
    payload.validate()?;
    let order = Order::new(
        prefixed_id("ord"),
        user.restaurant_id.clone(),
        payload,
        now_millis(),
    );

    let order = state.orders.insert(order).await.map_err(|e| match e {
        StoreError::Conflict(_) => ServiceError::App(AppError::new(ErrorCode::OrderIdExists)),
        other => other.into(),
    })?;

    tracing::info!(
        order_id = %order.order_id,
        restaurant_id = %order.restaurant_id,
        "Order created"
    );
    state.hub.publish(
        &order.restaurant_id,
        ServerEvent::OrderCreated {
            order: Box::new(order.clone()),
            restaurant_id: order.restaurant_id.clone(),
        },
    );
    Ok(order)
}

/// Set a status; entering `ready` notifies the customer
pub async fn update_status(
    state: &AppState,
    user: &CurrentUser,
    order_id: &str,
    status: Option<String>,
) -> ServiceResult<StatusChange> {
    let status = status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::required("Status is required."))?
        .trim()
        .parse::<OrderStatus>()?;

    let mut order = load(state, user, order_id).await?;
    let transition = order.apply_status(status, now_millis());
    state.orders.update(&order).await?;

    tracing::info!(
        order_id = %order.order_id,
        from = %transition.old_status,
        to = %transition.new_status,
        "Order status updated"
    );

    let mut notification = None;
    if transition.became_ready {
        let notice = ReadyNotice::load(state, &order.restaurant_id).await?;
        if notice.enabled {
            let (body, result) = state
                .notifier
                .send_order_ready(&order, &notice.template, notice.restaurant_name.as_deref())
                .await;
            order.add_notification(result.to_record(&body, now_millis()));
            state.orders.update(&order).await?;
            notification = Some(result);
        } else {
            tracing::debug!(order_id = %order.order_id, "Notifications disabled for account");
        }
    }

    state.hub.publish(
        &order.restaurant_id,
        ServerEvent::OrderStatusUpdated {
            order_id: order.order_id.clone(),
            status: order.status,
            old_status: transition.old_status,
            restaurant_id: order.restaurant_id.clone(),
            ready_at: order.ready_at,
            notification_sent: order.notification_sent,
        },
    );

    Ok(StatusChange {
        order,
        notification,
    })
}

pub async fn update(
    state: &AppState,
    user: &CurrentUser,
    order_id: &str,
    payload: OrderUpdate,
) -> ServiceResult<Order> {
    payload.validate()?;
    let mut order = load(state, user, order_id).await?;
    order.apply_update(payload, now_millis());
    state.orders.update(&order).await?;

    tracing::info!(order_id = %order.order_id, "Order updated");
    state.hub.publish(
        &order.restaurant_id,
        ServerEvent::OrderUpdated(json!({
            "order": order,
            "restaurantId": order.restaurant_id,
        })),
    );
    Ok(order)
}

pub async fn delete(state: &AppState, user: &CurrentUser, order_id: &str) -> ServiceResult<()> {
    if !state.orders.delete(&user.restaurant_id, order_id).await? {
        return Err(not_found().into());
    }
    tracing::info!(order_id = %order_id, restaurant_id = %user.restaurant_id, "Order deleted");
    state.hub.publish(
        &user.restaurant_id,
        ServerEvent::OrderDeleted {
            order_id: order_id.to_string(),
            restaurant_id: user.restaurant_id.clone(),
        },
    );
    Ok(())
}

/// Distinct ids in first-seen order; `None` when nothing is left
fn required_ids(ids: Option<Vec<String>>) -> Option<Vec<String>> {
    let mut seen = HashSet::new();
    ids.map(|ids| ids.into_iter().filter(|id| seen.insert(id.clone())).collect::<Vec<_>>())
        .filter(|ids| !ids.is_empty())
}

/// Same status for many orders; ready notifications go out one by one
pub async fn bulk_update_status(
    state: &AppState,
    user: &CurrentUser,
    req: BulkStatusRequest,
) -> ServiceResult<BulkStatusOutcome> {
    let (Some(order_ids), Some(status)) = (
        required_ids(req.order_ids),
        req.status.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(AppError::required("Order IDs array and status are required.").into());
    };
    let status = status.trim().parse::<OrderStatus>()?;

    let mut orders = state.orders.find_many(&user.restaurant_id, &order_ids).await?;
    let now = now_millis();
    let mut ready = Vec::new();
    for order in &mut orders {
        if order.apply_status(status, now).became_ready {
            ready.push(order.order_id.clone());
        }
        state.orders.update(order).await?;
    }

    let mut notifications = Vec::new();
    if !ready.is_empty() {
        let notice = ReadyNotice::load(state, &user.restaurant_id).await?;
        if notice.enabled {
            let targets: Vec<Order> = orders
                .iter()
                .filter(|o| ready.contains(&o.order_id))
                .cloned()
                .collect();
            let sent = state.notifier.send_paced(&targets, |o| notice.body(o)).await;
            for (body, delivery) in sent {
                if let Some(order) = orders.iter_mut().find(|o| o.order_id == delivery.order_id) {
                    order.add_notification(delivery.result.to_record(&body, now_millis()));
                    state.orders.update(order).await?;
                }
                notifications.push(delivery);
            }
        }
    }

    let updated_count = orders.len();
    tracing::info!(
        restaurant_id = %user.restaurant_id,
        status = %status,
        updated_count,
        notified = notifications.len(),
        "Bulk status update"
    );
    state.hub.publish(
        &user.restaurant_id,
        ServerEvent::BulkOrdersUpdated {
            order_ids: orders.iter().map(|o| o.order_id.clone()).collect(),
            status,
            restaurant_id: user.restaurant_id.clone(),
            updated_count,
        },
    );

    Ok(BulkStatusOutcome {
        message: format!("Updated {updated_count} orders to {status}."),
        updated_count,
        notifications,
    })
}

/// Message every listed order's customer, paced
pub async fn bulk_notify(
    state: &AppState,
    user: &CurrentUser,
    req: BulkNotifyRequest,
) -> ServiceResult<BulkNotifyOutcome> {
    let order_ids =
        required_ids(req.order_ids).ok_or_else(|| AppError::required("Order IDs array is required."))?;
    let custom = req.message.filter(|m| !m.trim().is_empty());

    let mut orders = state.orders.find_many(&user.restaurant_id, &order_ids).await?;
    let sent: Vec<(String, BulkDelivery)> = match custom {
        Some(text) => state
            .notifier
            .send_bulk(&orders, &text)
            .await
            .into_iter()
            .map(|delivery| (text.clone(), delivery))
            .collect(),
        None => {
            state
                .notifier
                .send_paced(&orders, |o| format::status_message(&o.order_id, o.status))
                .await
        }
    };

    let mut results = Vec::with_capacity(sent.len());
    for (body, delivery) in sent {
        if let Some(order) = orders.iter_mut().find(|o| o.order_id == delivery.order_id) {
            order.add_notification(delivery.result.to_record(&body, now_millis()));
            state.orders.update(order).await?;
        }
        results.push(delivery);
    }

    let delivered = results.iter().filter(|r| r.result.success).count();
    tracing::info!(
        restaurant_id = %user.restaurant_id,
        requested = order_ids.len(),
        delivered,
        "Bulk notification finished"
    );
    Ok(BulkNotifyOutcome {
        message: format!("Notifications processed for {} orders.", results.len()),
        results,
    })
}
