//! QR code API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/qr | GET, POST | owner / staff |
//! | /api/qr/stats/overview | GET | owner / staff |
//! | /api/qr/{key} | GET | none (records a scan) |
//! | /api/qr/{key} | PUT, DELETE | owner / staff (`key` = id or code) |
//! | /api/qr/{key}/image | GET | none |
//! | /api/qr/{key}/opt-in | POST | none |
//!
//! Public and protected methods share a path, so the protected handlers
//! check the principal themselves instead of sitting behind a layer.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/qr", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/stats/overview", get(handler::stats_overview))
        .route(
            "/{key}",
            get(handler::scan)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{key}/image", get(handler::image))
        .route("/{key}/opt-in", post(handler::opt_in))
}
