//! Status line for each [`ErrorCode`]

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Duplicate phone numbers and order ids answer 400, never 409.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::OrderNotFound | Self::QrCodeNotFound => StatusCode::NOT_FOUND,

            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            Self::PermissionDenied | Self::AccountDisabled => StatusCode::FORBIDDEN,

            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            Self::ValidationFailed
            | Self::RequiredField
            | Self::InvalidCredentials
            | Self::AlreadyExists
            | Self::PhoneNumberExists
            | Self::OrderIdExists
            | Self::OrderStatusInvalid
            | Self::OrderItemInvalid => StatusCode::BAD_REQUEST,

            // provider failure, not ours
            Self::NotificationFailed => StatusCode::BAD_GATEWAY,

            Self::QrRenderFailed | Self::InternalError | Self::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
