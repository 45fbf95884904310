//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Holds one typed client per vendor; each is
//! built once at startup from [`UpstreamConfig`] and is cheap to clone.

use std::sync::Arc;

use relay_upstream::{
    CchClient, FormationsClient, StaticTokenSource, TokenSource, UpstreamConfig, UpstreamError,
};

/// Process-level settings that are not owned by an upstream client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl AppConfig {
    /// Read `PORT` from the environment, falling back to 8080.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(Self::default().port);
        Self { port }
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub cch: CchClient,
    pub formations: FormationsClient,
}

impl AppState {
    pub fn new(config: AppConfig, cch: CchClient, formations: FormationsClient) -> Self {
        Self {
            config,
            cch,
            formations,
        }
    }

    /// Build both clients, seeding CCH credentials from configuration.
    pub fn from_upstream_config(
        config: AppConfig,
        upstream: &UpstreamConfig,
    ) -> Result<Self, UpstreamError> {
        let tokens: Arc<dyn TokenSource> = Arc::new(StaticTokenSource::from_config(&upstream.cch));
        Self::with_token_source(config, upstream, tokens)
    }

    /// Build both clients with an externally managed CCH token source.
    pub fn with_token_source(
        config: AppConfig,
        upstream: &UpstreamConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, UpstreamError> {
        Ok(Self::new(
            config,
            CchClient::new(&upstream.cch, tokens)?,
            FormationsClient::new(&upstream.formations)?,
        ))
    }

    /// Log which proxy routes will answer with a configuration error.
    pub fn warn_unconfigured(&self) {
        if !self.cch.is_configured() {
            tracing::warn!(
                "CCH_SUBSCRIPTION_KEY not set. /v1/tax/download-file will return 500."
            );
        }
        if !self.formations.is_configured() {
            tracing::warn!(
                "FORMATIONS_AUTH_TOKEN not set. /v1/formations/accounts/:account_id will return 500."
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_read_from_lookup() {
        let config = AppConfig::from_lookup(|key| (key == "PORT").then(|| "9090".to_string()));
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn missing_or_invalid_port_falls_back_to_default() {
        assert_eq!(AppConfig::from_lookup(|_| None).port, 8080);
        assert_eq!(AppConfig::from_lookup(|_| Some("http".to_string())).port, 8080);
    }

    #[test]
    fn state_carries_listen_port() {
        let upstream = UpstreamConfig::from_lookup(|_| None).unwrap();
        let state = AppState::from_upstream_config(AppConfig { port: 3000 }, &upstream).unwrap();
        assert_eq!(state.config.port, 3000);
    }
}
