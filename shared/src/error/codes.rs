//! Numeric error codes
//!
//! The leading digit groups codes by area:
//! - 0xxx: request shape and generic lookups
//! - 1xxx: login and sessions
//! - 2xxx: role checks
//! - 4xxx: orders
//! - 5xxx: QR codes
//! - 6xxx: outbound messaging
//! - 9xxx: server faults

use serde::{Deserialize, Serialize};
use std::fmt;

/// Code carried in every error body as `error.code`
///
/// Serialized as a bare number so dashboards can branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx ====================
    ValidationFailed = 2,
    NotFound = 3,
    AlreadyExists = 4,
    /// A mandatory field is absent or blank
    RequiredField = 7,
    TooManyRequests = 9,

    // ==================== 1xxx ====================
    /// No bearer token on a protected route
    NotAuthenticated = 1001,
    /// Wrong, expired or already-used one-time code
    InvalidCredentials = 1002,
    TokenExpired = 1003,
    TokenInvalid = 1004,
    AccountDisabled = 1007,
    PhoneNumberExists = 1101,

    // ==================== 2xxx ====================
    PermissionDenied = 2001,

    // ==================== 4xxx ====================
    OrderNotFound = 4001,
    /// Order ids are unique across every restaurant
    OrderIdExists = 4002,
    OrderStatusInvalid = 4003,
    /// Quantity below 1, negative price or unnamed item
    OrderItemInvalid = 4004,

    // ==================== 5xxx ====================
    /// Unknown code, or inactive on the public routes
    QrCodeNotFound = 5001,
    QrRenderFailed = 5002,

    // ==================== 6xxx ====================
    /// The messaging provider refused or timed out
    NotificationFailed = 6001,

    // ==================== 9xxx ====================
    InternalError = 9001,
    DatabaseError = 9002,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Fallback text when the caller supplies no message
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            ErrorCode::NotAuthenticated => "Access denied. No token provided.",
            ErrorCode::InvalidCredentials => "Invalid or expired OTP.",
            ErrorCode::TokenExpired => "Token expired.",
            ErrorCode::TokenInvalid => "Invalid token.",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::PhoneNumberExists => "User with this phone number already exists.",

            ErrorCode::PermissionDenied => "Insufficient permissions.",

            ErrorCode::OrderNotFound => "Order not found.",
            ErrorCode::OrderIdExists => "Order ID already exists.",
            ErrorCode::OrderStatusInvalid => "Invalid order status",
            ErrorCode::OrderItemInvalid => "Invalid order item",

            ErrorCode::QrCodeNotFound => "QR code not found.",
            ErrorCode::QrRenderFailed => "Failed to generate QR code image.",

            ErrorCode::NotificationFailed => "Notification delivery failed",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A number that names no [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            7 => ErrorCode::RequiredField,
            9 => ErrorCode::TooManyRequests,
            1001 => ErrorCode::NotAuthenticated,
            1002 => ErrorCode::InvalidCredentials,
            1003 => ErrorCode::TokenExpired,
            1004 => ErrorCode::TokenInvalid,
            1007 => ErrorCode::AccountDisabled,
            1101 => ErrorCode::PhoneNumberExists,
            2001 => ErrorCode::PermissionDenied,
            4001 => ErrorCode::OrderNotFound,
            4002 => ErrorCode::OrderIdExists,
            4003 => ErrorCode::OrderStatusInvalid,
            4004 => ErrorCode::OrderItemInvalid,
            5001 => ErrorCode::QrCodeNotFound,
            5002 => ErrorCode::QrRenderFailed,
            6001 => ErrorCode::NotificationFailed,
            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::QrCodeNotFound.code(), 5001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(4002), Ok(ErrorCode::OrderIdExists));
        assert_eq!(ErrorCode::try_from(1101), Ok(ErrorCode::PhoneNumberExists));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
        assert_eq!(ErrorCode::try_from(0), Err(InvalidErrorCode(0)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::QrCodeNotFound).unwrap();
        assert_eq!(json, "5001");
        let back: ErrorCode = serde_json::from_str("1003").unwrap();
        assert_eq!(back, ErrorCode::TokenExpired);
        assert!(serde_json::from_str::<ErrorCode>("77").is_err());
    }
}
