//! Per-IP fixed-window rate limiting for the public auth routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::state::AppState;

const WINDOW: Duration = Duration::from_secs(60);

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name → (IP → entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(&self, route: &'static str, ip: &str, max_requests: u32) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= WINDOW {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    /// Remove entries whose window has long passed
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let cutoff = WINDOW * 5;
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < cutoff);
        }
        map.retain(|_, route_map| !route_map.is_empty());
    }
}

/// Client IP: the peer address, or the first `X-Forwarded-For` entry when the
/// proxy in front is trusted to set it.
fn extract_ip(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy
        && let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn limit(
    state: &AppState,
    route: &'static str,
    max_requests: u32,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request, state.config.trust_proxy);
    if !state.rate_limiter.check(route, &ip, max_requests).await {
        crate::security_log!("WARN", "rate_limited", route = route, ip = ip.as_str());
        return Err(AppError::with_message(
            ErrorCode::TooManyRequests,
            "Too many requests, please try again later.",
        ));
    }
    Ok(next.run(request).await)
}

/// send-otp: 5 requests/minute per IP
pub async fn send_otp_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limit(&state, "send-otp", 5, request, next).await
}

/// verify-otp: 10 requests/minute per IP
pub async fn verify_otp_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limit(&state, "verify-otp", 10, request, next).await
}

/// register: 3 requests/minute per IP
pub async fn register_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limit(&state, "register", 3, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn window_blocks_after_max() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check("register", "1.2.3.4", 3).await);
        }
        assert!(!limiter.check("register", "1.2.3.4", 3).await);
        assert!(limiter.check("register", "5.6.7.8", 3).await);
        assert!(limiter.check("send-otp", "1.2.3.4", 3).await);
    }

    fn forwarded_from_peer(forwarded: &str) -> Request {
        let mut request = http::Request::builder()
            .header("x-forwarded-for", forwarded)
            .body(axum::body::Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(axum::extract::ConnectInfo(std::net::SocketAddr::from((
                [10, 0, 0, 7],
                40_000,
            ))));
        request
    }

    #[test]
    fn forwarded_header_ignored_unless_trusted() {
        let request = forwarded_from_peer("203.0.113.9, 10.0.0.1");
        assert_eq!(extract_ip(&request, false), "10.0.0.7");
        assert_eq!(extract_ip(&request, true), "203.0.113.9");
    }

    #[test]
    fn no_peer_falls_back_to_unknown() {
        let request = http::Request::builder().body(axum::body::Body::empty()).unwrap();
        assert_eq!(extract_ip(&request, false), "unknown");
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("verify-otp", "ip", 1).await);
        assert!(!limiter.check("verify-otp", "ip", 1).await);
        tokio::time::advance(WINDOW).await;
        assert!(limiter.check("verify-otp", "ip", 1).await);
    }
}
