//! Errors as the dashboard and scan page see them
//!
//! An [`AppError`] pairs a numeric [`ErrorCode`] with a message and renders
//! as an [`ErrorEnvelope`]. [`ErrorCategory`] only feeds server-side logging.
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::OrderNotFound);
//! assert_eq!(err.message, "Order not found.");
//!
//! let err = AppError::validation("Missing required field")
//!     .with_detail("field", "phoneNumber");
//! assert_eq!(err.http_status().as_u16(), 400);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult, ErrorBody, ErrorEnvelope};
