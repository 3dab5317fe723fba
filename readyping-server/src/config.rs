//! Server configuration

use crate::BoxError;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// HTTP port
    pub http_port: u16,
    /// PostgreSQL connection URL; `None` runs on the in-memory store
    pub database_url: Option<String>,
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,
    /// Session lifetime in days
    pub jwt_expiry_days: i64,
    /// Frontend origin (CORS + opt-in URLs)
    pub frontend_url: String,
    /// Live gateway credentials; all three present switches demo mode off
    pub twilio: Option<TwilioConfig>,
    /// Country code prefixed to bare 10-digit numbers
    pub default_country_code: String,
    /// Echo the OTP in the send-otp response
    pub expose_otp: bool,
    /// Pause between bulk sends
    pub bulk_send_interval_ms: u64,
    /// Behind a reverse proxy: rate limits key on `X-Forwarded-For`
    pub trust_proxy: bool,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub whatsapp_number: String,
    pub api_base: String,
}

impl Config {
    /// Signing secrets are mandatory outside development; local runs fall back
    /// to a fixed throwaway value.
    fn secret(name: &str, value: Option<String>, environment: &str) -> Result<String, BoxError> {
        match value {
            Some(value) => Ok(value),
            None if environment == "development" => {
                tracing::warn!("{name} not set, signing with a development-only secret");
                Ok(format!("readyping-dev-{}", name.to_lowercase()))
            }
            None => Err(format!("{name} is required when ENVIRONMENT={environment}").into()),
        }
    }

    fn non_empty(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.trim().is_empty())
    }

    fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
        std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let production = environment == "production";

        let twilio = match (
            Self::non_empty("TWILIO_ACCOUNT_SID"),
            Self::non_empty("TWILIO_AUTH_TOKEN"),
            Self::non_empty("TWILIO_WHATSAPP_NUMBER"),
        ) {
            (Some(account_sid), Some(auth_token), Some(whatsapp_number)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                whatsapp_number,
                api_base: std::env::var("TWILIO_API_BASE")
                    .unwrap_or_else(|_| "https://api.twilio.com".into()),
            }),
            _ => None,
        };

        Ok(Self {
            http_port: Self::parsed("HTTP_PORT")
                .or_else(|| Self::parsed("PORT"))
                .unwrap_or(3000),
            database_url: Self::non_empty("DATABASE_URL"),
            jwt_secret: Self::secret("JWT_SECRET", Self::non_empty("JWT_SECRET"), &environment)?,
            jwt_expiry_days: Self::parsed("JWT_EXPIRY_DAYS").unwrap_or(7),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            twilio,
            default_country_code: std::env::var("DEFAULT_COUNTRY_CODE")
                .unwrap_or_else(|_| "1".into()),
            expose_otp: Self::parsed("EXPOSE_OTP").unwrap_or(!production),
            bulk_send_interval_ms: Self::parsed("BULK_SEND_INTERVAL_MS").unwrap_or(1000),
            trust_proxy: Self::parsed("TRUST_PROXY").unwrap_or(false),
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Development defaults, in-memory store, demo gateway, no bulk pacing
    pub fn for_tests() -> Self {
        Self {
            environment: "test".into(),
            http_port: 0,
            database_url: None,
            jwt_secret: "test-secret-at-least-32-characters-long".into(),
            jwt_expiry_days: 7,
            frontend_url: "http://localhost:8080".into(),
            twilio: None,
            default_country_code: "1".into(),
            expose_otp: true,
            bulk_send_interval_ms: 0,
            trust_proxy: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_required_outside_development() {
        let err = Config::secret("JWT_SECRET", None, "production").unwrap_err();
        assert_eq!(err.to_string(), "JWT_SECRET is required when ENVIRONMENT=production");
        assert!(Config::secret("JWT_SECRET", None, "staging").is_err());
    }

    #[test]
    fn development_gets_fallback_secret() {
        let dev = Config::secret("JWT_SECRET", None, "development").unwrap();
        assert_eq!(dev, "readyping-dev-jwt_secret");
        let set = Config::secret("JWT_SECRET", Some("s3cret".into()), "production").unwrap();
        assert_eq!(set, "s3cret");
    }
}
