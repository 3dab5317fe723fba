//! Business operations behind the HTTP handlers
//!
//! Each function takes the shared [`AppState`](crate::state::AppState) and, for
//! protected operations, the request principal; results use
//! [`ServiceResult`](crate::error::ServiceResult).

pub mod analytics;
pub mod credentials;
pub mod orders;
pub mod qr;
