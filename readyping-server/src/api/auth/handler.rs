//! Auth API Handlers

use axum::{Json, extract::State, http::StatusCode};
use shared::error::AppResult;
use shared::models::{ProfileUpdate, RegisterRequest};

use crate::api::{AppJson, MessageResponse};
use crate::auth::CurrentUser;
use crate::services::credentials::{
    self, ProfileResponse, SendOtpRequest, SendOtpResponse, SessionResponse, VerifyOtpRequest,
};
use crate::state::AppState;

/// POST /api/auth/send-otp
pub async fn send_otp(
    State(state): State<AppState>,
    AppJson(req): AppJson<SendOtpRequest>,
) -> AppResult<Json<SendOtpResponse>> {
    Ok(Json(credentials::send_otp(&state, req)?))
}

/// POST /api/auth/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(req): AppJson<VerifyOtpRequest>,
) -> AppResult<Json<SessionResponse>> {
    Ok(Json(credentials::verify_otp(&state, req).await?))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let session = credentials::register(&state, req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/auth/profile
pub async fn profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ProfileResponse>> {
    Ok(Json(credentials::profile(&state, &user).await?))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(update): AppJson<ProfileUpdate>,
) -> AppResult<Json<ProfileResponse>> {
    Ok(Json(credentials::update_profile(&state, &user, update).await?))
}

/// POST /api/auth/logout
///
/// Sessions are stateless; the client drops its token.
pub async fn logout(user: CurrentUser) -> Json<MessageResponse> {
    tracing::info!(user_id = %user.id, "Logout");
    MessageResponse::new("Logout successful.")
}
