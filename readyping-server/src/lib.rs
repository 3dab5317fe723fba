//! readyping-server: order-ready notification backend
//!
//! - REST API for restaurant staff (orders, QR codes, analytics)
//! - OTP login and JWT sessions
//! - WhatsApp notifications when an order becomes ready
//! - Per-restaurant real-time push over WebSocket

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod live;
pub mod notify;
pub mod services;
pub mod state;

pub use config::Config;
pub use state::AppState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Security event logging under the `security` target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
