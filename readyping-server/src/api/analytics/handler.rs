//! Analytics API Handlers

use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use shared::error::AppResult;

use crate::api::AppQuery;
use crate::auth::CurrentUser;
use crate::services::analytics::{self, Dashboard, Performance, Period, Trends};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    days: Option<i64>,
}

/// GET /api/analytics/dashboard?period=today
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppQuery(query): AppQuery<PeriodQuery>,
) -> AppResult<Json<Dashboard>> {
    let period = Period::parse_or(query.period.as_deref(), Period::Today)?;
    Ok(Json(analytics::dashboard(&state, &user, period).await?))
}

/// GET /api/analytics/orders/trends?days=7
pub async fn trends(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppQuery(query): AppQuery<TrendsQuery>,
) -> AppResult<Json<Trends>> {
    Ok(Json(analytics::trends(&state, &user, query.days).await?))
}

/// GET /api/analytics/performance?period=month
pub async fn performance(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppQuery(query): AppQuery<PeriodQuery>,
) -> AppResult<Json<Performance>> {
    let period = Period::parse_or(query.period.as_deref(), Period::Month)?;
    Ok(Json(analytics::performance(&state, &user, period).await?))
}
