//! Shared types for ReadyPing
//!
//! Domain models, the error system and the real-time frame types used by
//! the server and its clients.

pub mod error;
pub mod live;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
