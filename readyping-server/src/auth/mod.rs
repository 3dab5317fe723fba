//! Authentication and authorization
//!
//! - [`JwtService`]: session token issue / validation
//! - [`OtpStore`]: pending one-time codes
//! - [`CurrentUser`]: request principal (extractor + middleware)
//! - [`rate_limit`]: per-IP fixed windows for the public auth routes

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod otp;
pub mod rate_limit;

use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::Role;

pub use jwt::{Claims, JwtError, JwtService};
pub use middleware::{require_auth, require_role};
pub use otp::{OTP_TTL_MS, OtpRecord, OtpStore};
pub use rate_limit::RateLimiter;

/// Roles allowed to manage orders, QR codes and analytics
pub const STAFF_ROLES: &[Role] = &[Role::Owner, Role::Staff];

/// Authenticated principal, rebuilt from token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub phone_number: String,
    pub role: Role,
    pub name: Option<String>,
    /// Group for real-time events and data scoping
    pub restaurant_id: String,
}

impl CurrentUser {
    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if self.has_role(roles) {
            Ok(())
        } else {
            crate::security_log!(
                "WARN",
                "role_denied",
                user_id = self.id.as_str(),
                role = self.role.as_str()
            );
            Err(AppError::with_message(
                ErrorCode::PermissionDenied,
                "Access denied. Insufficient permissions.",
            ))
        }
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            phone_number: claims.phone,
            role: claims.role,
            name: claims.name,
            restaurant_id: claims.restaurant_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_is_not_staff() {
        let user = CurrentUser {
            id: "cust_1".into(),
            phone_number: "+15551234567".into(),
            role: Role::Customer,
            name: Some("Customer 4567".into()),
            restaurant_id: "cust_1".into(),
        };
        let err = user.require_role(STAFF_ROLES).unwrap_err();
        assert_eq!(err.http_status().as_u16(), 403);
        assert!(user.require_role(&[Role::Customer]).is_ok());
    }
}
