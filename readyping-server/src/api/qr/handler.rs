//! QR code API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use shared::error::AppResult;
use shared::models::{OptInRequest, QrCode, QrCodeCreate, QrCodeUpdate, QrPublicView};

use crate::api::{AppJson, AppQuery, MessageResponse};
use crate::auth::{CurrentUser, STAFF_ROLES};
use crate::services::qr::{self, ImageQuery, OptInResponse, QrImage, QrOverview};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeList {
    qr_codes: Vec<QrCode>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    qr_code: T,
}

/// GET /api/qr
pub async fn list(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<QrCodeList>> {
    user.require_role(STAFF_ROLES)?;
    let qr_codes = qr::list(&state, &user).await?;
    Ok(Json(QrCodeList { qr_codes }))
}

/// GET /api/qr/stats/overview
pub async fn stats_overview(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<QrOverview>> {
    user.require_role(STAFF_ROLES)?;
    Ok(Json(qr::overview(&state, &user).await?))
}

/// POST /api/qr
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<QrCodeCreate>,
) -> AppResult<(StatusCode, Json<QrCodeResponse<QrCode>>)> {
    user.require_role(STAFF_ROLES)?;
    let qr_code = qr::create(&state, &user, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(QrCodeResponse {
            message: Some("QR code created successfully."),
            qr_code,
        }),
    ))
}

/// PUT /api/qr/{key}
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(key): Path<String>,
    AppJson(payload): AppJson<QrCodeUpdate>,
) -> AppResult<Json<QrCodeResponse<QrCode>>> {
    user.require_role(STAFF_ROLES)?;
    let qr_code = qr::update(&state, &user, &key, payload).await?;
    Ok(Json(QrCodeResponse {
        message: Some("QR code updated successfully."),
        qr_code,
    }))
}

/// DELETE /api/qr/{key}
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(key): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    user.require_role(STAFF_ROLES)?;
    qr::delete(&state, &user, &key).await?;
    Ok(MessageResponse::new("QR code deleted successfully."))
}

/// GET /api/qr/{code} (public)
pub async fn scan(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<QrCodeResponse<QrPublicView>>> {
    let qr_code = qr::scan(&state, &code).await?;
    Ok(Json(QrCodeResponse {
        message: None,
        qr_code,
    }))
}

/// GET /api/qr/{code}/image (public)
pub async fn image(
    State(state): State<AppState>,
    Path(code): Path<String>,
    AppQuery(query): AppQuery<ImageQuery>,
) -> AppResult<Json<QrImage>> {
    Ok(Json(qr::image(&state, &code, query).await?))
}

/// POST /api/qr/{code}/opt-in (public)
pub async fn opt_in(
    State(state): State<AppState>,
    Path(code): Path<String>,
    AppJson(req): AppJson<OptInRequest>,
) -> AppResult<Json<OptInResponse>> {
    Ok(Json(qr::opt_in(&state, &code, req).await?))
}
