//! Order API
//!
//! Every route requires a bearer token with role `owner` or `staff`; orders
//! are always scoped to the principal's restaurant.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::{STAFF_ROLES, require_auth, require_role};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().nest("/api/orders", routes(state))
}

fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/stats/overview", get(handler::stats_overview))
        .route("/bulk/status", post(handler::bulk_status))
        .route("/bulk/notify", post(handler::bulk_notify))
        .route(
            "/{order_id}",
            get(handler::get_by_id)
                .put(handler::update)
                .patch(handler::update_status)
                .delete(handler::delete),
        )
        .route("/{order_id}/status", patch(handler::update_status))
        .layer(middleware::from_fn(require_role(STAFF_ROLES)))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
