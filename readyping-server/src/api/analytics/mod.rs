//! Analytics API (owner / staff)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::{STAFF_ROLES, require_auth, require_role};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().nest("/api/analytics", routes(state))
}

fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handler::dashboard))
        .route("/orders/trends", get(handler::trends))
        .route("/performance", get(handler::performance))
        .layer(middleware::from_fn(require_role(STAFF_ROLES)))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
