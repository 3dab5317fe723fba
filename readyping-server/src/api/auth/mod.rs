//! Auth API
//!
//! | Path | Method | Auth | Rate limit |
//! |------|--------|------|------------|
//! | /api/auth/send-otp | POST | none | 5/min |
//! | /api/auth/verify-otp | POST | none | 10/min |
//! | /api/auth/register | POST | none | 3/min |
//! | /api/auth/profile | GET, PUT | bearer | - |
//! | /api/auth/logout | POST | bearer | - |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_auth;
use crate::auth::rate_limit::{register_rate_limit, send_otp_rate_limit, verify_otp_rate_limit};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().nest("/api/auth", routes(state))
}

fn routes(state: &AppState) -> Router<AppState> {
    let send_otp = Router::new()
        .route("/send-otp", post(handler::send_otp))
        .layer(middleware::from_fn_with_state(state.clone(), send_otp_rate_limit));

    let verify_otp = Router::new()
        .route("/verify-otp", post(handler::verify_otp))
        .layer(middleware::from_fn_with_state(state.clone(), verify_otp_rate_limit));

    let register = Router::new()
        .route("/register", post(handler::register))
        .layer(middleware::from_fn_with_state(state.clone(), register_rate_limit));

    let session = Router::new()
        .route("/profile", get(handler::profile).put(handler::update_profile))
        .route("/logout", post(handler::logout))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    send_otp.merge(verify_otp).merge(register).merge(session)
}
