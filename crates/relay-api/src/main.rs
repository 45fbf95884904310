//! # relay-api -- Binary Entry Point
//!
//! Starts the Axum HTTP server. Binds to `PORT` (default 8080).

use relay_api::state::{AppConfig, AppState};
use relay_upstream::UpstreamConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let upstream = UpstreamConfig::from_env().map_err(|e| {
        tracing::error!("Invalid upstream configuration: {e}");
        e
    })?;
    tracing::debug!(?upstream, "upstream configuration loaded");

    let state = AppState::from_upstream_config(AppConfig::from_env(), &upstream).map_err(|e| {
        tracing::error!("Failed to build upstream clients: {e}");
        e
    })?;
    state.warn_unconfigured();

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = relay_api::app(state);

    tracing::info!("Relay API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
