//! Order API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use shared::error::AppResult;
use shared::models::{OrderCreate, OrderUpdate, OrderView};
use shared::util::now_millis;

use crate::api::{AppJson, AppQuery, MessageResponse};
use crate::auth::CurrentUser;
use crate::notify::DeliveryResult;
use crate::services::analytics::{self, OrderOverview, Period};
use crate::services::orders::{
    self, BulkNotifyOutcome, BulkNotifyRequest, BulkStatusOutcome, BulkStatusRequest, ListQuery,
    OrderList,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    order: OrderView,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<DeliveryResult>,
}

impl OrderResponse {
    fn new(message: Option<&'static str>, order: shared::models::Order) -> Self {
        Self {
            message,
            order: OrderView::at(order, now_millis()),
            notification: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    period: Option<String>,
}

/// GET /api/orders
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<OrderList>> {
    Ok(Json(orders::list(&state, &user, query).await?))
}

/// GET /api/orders/stats/overview
pub async fn stats_overview(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppQuery(query): AppQuery<PeriodQuery>,
) -> AppResult<Json<OrderOverview>> {
    let period = Period::parse_or(query.period.as_deref(), Period::Today)?;
    Ok(Json(analytics::order_overview(&state, &user, period).await?))
}

/// GET /api/orders/{order_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<String>,
) -> AppResult<Json<OrderResponse>> {
    let order = orders::get(&state, &user, &order_id).await?;
    Ok(Json(OrderResponse::new(None, order)))
}

/// POST /api/orders
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppJson(payload): AppJson<OrderCreate>,
) -> AppResult<(StatusCode, Json<OrderResponse>)> {
    let order = orders::create(&state, &user, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderResponse::new(Some("Order created successfully."), order)),
    ))
}

/// PATCH /api/orders/{order_id} and /api/orders/{order_id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<String>,
    AppJson(body): AppJson<StatusBody>,
) -> AppResult<Json<OrderResponse>> {
    let change = orders::update_status(&state, &user, &order_id, body.status).await?;
    let mut response = OrderResponse::new(Some("Order status updated successfully."), change.order);
    response.notification = change.notification;
    Ok(Json(response))
}

/// PUT /api/orders/{order_id}
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<String>,
    AppJson(payload): AppJson<OrderUpdate>,
) -> AppResult<Json<OrderResponse>> {
    let order = orders::update(&state, &user, &order_id, payload).await?;
    Ok(Json(OrderResponse::new(Some("Order updated successfully."), order)))
}

/// DELETE /api/orders/{order_id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    orders::delete(&state, &user, &order_id).await?;
    Ok(MessageResponse::new("Order deleted successfully."))
}

/// POST /api/orders/bulk/status
pub async fn bulk_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppJson(req): AppJson<BulkStatusRequest>,
) -> AppResult<Json<BulkStatusOutcome>> {
    Ok(Json(orders::bulk_update_status(&state, &user, req).await?))
}

/// POST /api/orders/bulk/notify
pub async fn bulk_notify(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppJson(req): AppJson<BulkNotifyRequest>,
) -> AppResult<Json<BulkNotifyOutcome>> {
    Ok(Json(orders::bulk_notify(&state, &user, req).await?))
}
