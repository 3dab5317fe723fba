//! readyping-server binary
//!
//! Loads `.env`, initializes tracing, builds state (Postgres or in-memory)
//! and serves the HTTP + WebSocket API.

use std::net::SocketAddr;

use readyping_server::{AppState, BoxError, Config, api};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env()?;
    tracing::info!(
        "Starting readyping-server {} (env: {})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );
    if config.expose_otp && config.is_production() {
        tracing::warn!("EXPOSE_OTP is on in production: one-time codes are returned in API responses");
    }

    let http_port = config.http_port;
    let state = AppState::new(config).await?;
    state.spawn_background_tasks();

    let app = api::build_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("readyping-server listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("readyping-server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "readyping_server=info,tower_http=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
