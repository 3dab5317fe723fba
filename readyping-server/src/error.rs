//! Unified service-layer error type
//!
//! `ServiceError` bridges store-layer errors and the API-layer error (`AppError`),
//! so services can use `?` on store calls without per-call `map_err` logging.

use std::sync::OnceLock;

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::BoxError;
use crate::config::Config;
use crate::db::StoreError;

/// Whether 500 bodies carry the store cause; unset means no
static EXPOSE_CAUSES: OnceLock<bool> = OnceLock::new();

/// Fix cause exposure for the process from the loaded config (first call wins)
pub fn configure(config: &Config) {
    let _ = EXPOSE_CAUSES.set(!config.is_production());
}

/// Service-layer error
///
/// - `Store`: persistence / infrastructure errors (auto-logged, mapped to InternalError)
/// - `App`: business-rule errors (transparent pass-through to client)
#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    App(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Store(e)
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Store(StoreError::Backend(e))
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Store(StoreError::Conflict(message)) => {
                AppError::with_message(ErrorCode::AlreadyExists, message)
            }
            ServiceError::Store(StoreError::Backend(err)) => {
                internal(&err, EXPOSE_CAUSES.get().copied().unwrap_or(false))
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

fn internal(err: &BoxError, expose_cause: bool) -> AppError {
    tracing::error!(error = %err, "Service store error");
    let app_err = AppError::new(ErrorCode::InternalError);
    if expose_cause {
        app_err.with_detail("cause", err.to_string())
    } else {
        app_err
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;
