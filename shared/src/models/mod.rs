//! Data models
//!
//! Shared between the server and its clients (via API).
//! Timestamps are epoch milliseconds (`i64`); JSON is camelCase.

pub mod account;
pub mod order;
pub mod qr_code;

// Re-exports
pub use account::*;
pub use order::*;
pub use qr_code::*;
