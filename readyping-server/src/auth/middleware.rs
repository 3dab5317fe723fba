//! Authentication middleware
//!
//! `require_auth` validates the bearer token and injects [`CurrentUser`] into
//! the request extensions; `require_role` then gates on the principal's role.
//!
//! | Failure | Status |
//! |---------|--------|
//! | no Authorization header | 401 NotAuthenticated |
//! | expired token | 401 TokenExpired |
//! | bad token | 401 TokenInvalid |
//! | role not allowed | 403 PermissionDenied |

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;
use shared::models::Role;

use super::CurrentUser;
use super::extractor::authenticate;
use crate::state::AppState;

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // CORS preflight
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let user = authenticate(req.headers(), req.uri().path(), &state.jwt)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Role gate; layer it inside `require_auth`
///
/// ```ignore
/// Router::new()
///     .route("/api/orders", get(list))
///     .layer(middleware::from_fn(require_role(STAFF_ROLES)))
///     .layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub fn require_role(
    roles: &'static [Role],
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            if req.method() == http::Method::OPTIONS {
                return Ok(next.run(req).await);
            }
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::unauthorized)?;
            user.require_role(roles)?;
            Ok(next.run(req).await)
        })
    }
}
