//! JWT token service
//!
//! Issues and validates HS256 session tokens. The principal is rebuilt from
//! claims alone; nothing is looked up per request and tokens cannot be revoked.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::models::Role;
use thiserror::Error;

use super::CurrentUser;

const ISSUER: &str = "readyping";

/// Claims stored in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Principal id (account id, or ephemeral customer id)
    pub sub: String,
    pub phone: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Restaurant group this principal belongs to
    pub restaurant_id: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    ExpiredToken,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

#[derive(Clone)]
pub struct JwtService {
    expiry_days: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiry_days", &self.expiry_days)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn new(secret: &str, expiry_days: i64) -> Self {
        Self {
            expiry_days,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a session token for a principal
    pub fn generate_token(&self, user: &CurrentUser) -> Result<String, JwtError> {
        self.generate_token_at(user, Utc::now().timestamp())
    }

    pub fn generate_token_at(&self, user: &CurrentUser, issued_at: i64) -> Result<String, JwtError> {
        let claims = Claims {
            sub: user.id.clone(),
            phone: user.phone_number.clone(),
            role: user.role,
            name: user.name.clone(),
            restaurant_id: user.restaurant_id.clone(),
            exp: issued_at + Duration::days(self.expiry_days).num_seconds(),
            iat: issued_at,
            iss: ISSUER.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Validate signature, expiry and issuer
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Token from an `Authorization` header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> CurrentUser {
        CurrentUser {
            id: "acc_1".into(),
            phone_number: "+15551234567".into(),
            role: Role::Owner,
            name: Some("Cafe".into()),
            restaurant_id: "acc_1".into(),
        }
    }

    #[test]
    fn roundtrip() {
        let jwt = JwtService::new("secret-secret-secret-secret-secret", 7);
        let token = jwt.generate_token(&owner()).unwrap();
        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "acc_1");
        assert_eq!(claims.role, Role::Owner);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn expired_token() {
        let jwt = JwtService::new("secret-secret-secret-secret-secret", 7);
        let long_ago = Utc::now().timestamp() - 8 * 24 * 3600;
        let token = jwt.generate_token_at(&owner(), long_ago).unwrap();
        assert!(matches!(jwt.validate_token(&token), Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn wrong_secret() {
        let a = JwtService::new("secret-a-secret-a-secret-a-secret-a", 7);
        let b = JwtService::new("secret-b-secret-b-secret-b-secret-b", 7);
        let token = a.generate_token(&owner()).unwrap();
        assert!(matches!(b.validate_token(&token), Err(JwtError::InvalidSignature)));
        assert!(matches!(
            b.validate_token("not.a.token"),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn header_parsing() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
    }
}
