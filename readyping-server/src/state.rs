//! Application state

use std::sync::Arc;
use std::time::Duration;

use crate::BoxError;
use crate::auth::{JwtService, OtpStore, RateLimiter};
use crate::config::Config;
use crate::db::{AccountStore, MemoryStore, OrderStore, PgStore, QrCodeStore};
use crate::live::RoomHub;
use crate::notify::Notifier;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: Arc<dyn AccountStore>,
    pub orders: Arc<dyn OrderStore>,
    pub qr_codes: Arc<dyn QrCodeStore>,
    /// Pending one-time codes (always in process memory)
    pub otp: OtpStore,
    pub jwt: JwtService,
    pub notifier: Notifier,
    /// Per-restaurant real-time rooms
    pub hub: RoomHub,
    /// Rate limiter for the public auth routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Build state from config: Postgres when `DATABASE_URL` is set, memory otherwise
    pub async fn new(config: Config) -> Result<Self, BoxError> {
        match config.database_url.clone() {
            Some(url) => {
                let store = PgStore::connect(&url).await?;
                tracing::info!("Using PostgreSQL store");
                let notifier = Notifier::from_config(&config);
                Ok(Self::assemble(config, store, notifier))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
                let notifier = Notifier::from_config(&config);
                Ok(Self::assemble(config, MemoryStore::new(), notifier))
            }
        }
    }

    /// In-memory store with the given notifier
    pub fn in_memory(config: Config, notifier: Notifier) -> Self {
        Self::assemble(config, MemoryStore::new(), notifier)
    }

    fn assemble<S>(config: Config, store: S, notifier: Notifier) -> Self
    where
        S: AccountStore + OrderStore + QrCodeStore + Clone + 'static,
    {
        crate::error::configure(&config);
        let jwt = JwtService::new(&config.jwt_secret, config.jwt_expiry_days);
        Self {
            accounts: Arc::new(store.clone()),
            orders: Arc::new(store.clone()),
            qr_codes: Arc::new(store),
            otp: OtpStore::new(),
            jwt,
            notifier,
            hub: RoomHub::new(),
            rate_limiter: RateLimiter::new(),
            config: Arc::new(config),
        }
    }

    /// Periodic housekeeping: expired OTPs every minute, rate-limit windows
    /// and empty rooms every five.
    pub fn spawn_background_tasks(&self) {
        let otp = self.otp.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                let swept = otp.sweep(shared::util::now_millis());
                if swept > 0 {
                    tracing::debug!(swept, "Expired OTP records removed");
                }
            }
        });

        let rate_limiter = self.rate_limiter.clone();
        let hub = self.hub.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                rate_limiter.cleanup().await;
                hub.prune();
            }
        });
    }
}
