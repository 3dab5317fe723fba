//! Principal extractor
//!
//! Use `CurrentUser` as a handler argument to require a valid bearer token.
//! Routes behind [`require_auth`](super::require_auth) reuse the principal the
//! middleware already placed in the request extensions.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use shared::error::AppError;

use super::{CurrentUser, JwtError, JwtService};
use crate::security_log;
use crate::state::AppState;

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let user = authenticate(&parts.headers, parts.uri.path(), &state.jwt)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Validate the `Authorization: Bearer` header
pub fn authenticate(headers: &HeaderMap, path: &str, jwt: &JwtService) -> Result<CurrentUser, AppError> {
    let header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match header {
        Some(value) => JwtService::extract_from_header(value).ok_or_else(|| {
            security_log!("WARN", "auth_malformed", uri = path);
            AppError::invalid_token("Invalid authorization header.")
        })?,
        None => {
            security_log!("WARN", "auth_missing", uri = path);
            return Err(AppError::unauthorized());
        }
    };

    verify(token, path, jwt)
}

/// Validate a raw token (also used for WebSocket query tokens)
pub fn verify(token: &str, path: &str, jwt: &JwtService) -> Result<CurrentUser, AppError> {
    jwt.validate_token(token).map(CurrentUser::from).map_err(|e| {
        security_log!("WARN", "auth_failed", error = e.to_string(), uri = path);
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token."),
        }
    })
}
