//! HTTP surface
//!
//! # Structure
//!
//! - [`health`] - liveness check (public)
//! - [`auth`] - OTP login, registration, profile
//! - [`orders`] - order workflow (owner / staff)
//! - [`qr`] - QR registry; scan, image and opt-in are public
//! - [`analytics`] - dashboards (owner / staff)
//! - [`ws`] - per-restaurant real-time channel

pub mod analytics;
pub mod auth;
pub mod health;
pub mod orders;
pub mod qr;
pub mod ws;

use axum::Router;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::{HeaderName, HeaderValue, Method, Uri};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// JSON body extractor whose rejections use the error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query extractor whose rejections use the error envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// `{"message": ...}`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> axum::Json<Self> {
        axum::Json(Self { message })
    }
}

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// All routes, no outer middleware
pub fn build_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state))
        .merge(orders::router(state))
        .merge(qr::router())
        .merge(analytics::router(state))
        .merge(ws::router())
        .fallback(not_found)
}

/// Fully configured application; used by the server and by tests
pub fn build_app(state: AppState) -> Router {
    let request_id = HeaderName::from_static("x-request-id");
    build_router(&state)
        .layer(cors(&state.config.frontend_url))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id.clone(), XRequestId))
        .layer(PropagateRequestIdLayer::new(request_id))
        .with_state(state)
}

fn cors(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE]);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => layer
            .allow_origin(AllowOrigin::exact(origin))
            .allow_credentials(true),
        Err(_) => {
            tracing::warn!(frontend_url, "FRONTEND_URL is not a valid origin, allowing any");
            layer.allow_origin(Any)
        }
    }
}

async fn not_found(uri: Uri) -> Response {
    let body = serde_json::json!({
        "error": {
            "message": "Route not found",
            "code": ErrorCode::NotFound,
            "path": uri.path(),
        }
    });
    (http::StatusCode::NOT_FOUND, axum::Json(body)).into_response()
}
