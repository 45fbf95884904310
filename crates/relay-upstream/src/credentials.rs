//! # OAuth Credential Capability
//!
//! The CCH Axcess API is OAuth-protected. Route handlers never see tokens:
//! they hand a request builder to [`AuthenticatedClient`], which obtains a
//! valid [`StoredTokens`] bundle from a [`TokenSource`] and attaches it.
//!
//! ## Refresh-on-expiry
//!
//! ```text
//! current() ──► expired? ──yes──► refresh() ──┐
//!                  │ no                       │
//!                  ▼                          ▼
//!               send ◄────────────────────────┘
//!                  │
//!              401? ──yes──► refresh() ──► send once more
//! ```
//!
//! The refresh grant itself belongs to the `TokenSource` implementation.
//! [`StaticTokenSource`] serves tokens seeded from configuration and cannot
//! refresh; a `401` from upstream is then returned to the caller unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::config::CchConfig;
use crate::error::UpstreamError;

/// Opaque OAuth credential bundle.
#[derive(Clone)]
pub struct StoredTokens {
    access_token: Zeroizing<String>,
    refresh_token: Option<Zeroizing<String>>,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredTokens {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Zeroizing::new(access_token.into()),
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(Zeroizing::new(refresh_token.into()));
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().map(String::as_str)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Tokens without a recorded expiry never expire locally; upstream
    /// rejection (`401`) is the only signal for those.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub(crate) fn access_token(&self) -> &str {
        self.access_token.as_str()
    }
}

impl std::fmt::Debug for StoredTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Errors from a [`TokenSource`].
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("no stored access token; complete the CCH OAuth authorization first")]
    Missing,
    #[error("token refresh is not supported by this token source")]
    RefreshUnavailable,
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
}

/// Supplier of valid OAuth tokens.
///
/// Object safe so the application can hold an `Arc<dyn TokenSource>` and
/// swap in a refreshing implementation without touching handlers.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return the currently stored tokens.
    async fn current(&self) -> Result<StoredTokens, CredentialError>;

    /// Exchange `stale` for a fresh bundle and persist it for later calls.
    async fn refresh(&self, stale: &StoredTokens) -> Result<StoredTokens, CredentialError>;
}

/// Token source seeded once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenSource {
    tokens: Option<StoredTokens>,
}

impl StaticTokenSource {
    pub fn new(tokens: Option<StoredTokens>) -> Self {
        Self { tokens }
    }

    /// Build from `CCH_ACCESS_TOKEN` / `CCH_REFRESH_TOKEN`.
    pub fn from_config(config: &CchConfig) -> Self {
        let tokens = config.access_token.as_ref().map(|access| {
            let tokens = StoredTokens::new(access.as_str());
            match &config.refresh_token {
                Some(refresh) => tokens.with_refresh_token(refresh.as_str()),
                None => tokens,
            }
        });
        Self { tokens }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn current(&self) -> Result<StoredTokens, CredentialError> {
        self.tokens.clone().ok_or(CredentialError::Missing)
    }

    async fn refresh(&self, _stale: &StoredTokens) -> Result<StoredTokens, CredentialError> {
        Err(CredentialError::RefreshUnavailable)
    }
}

/// HTTP client that attaches OAuth bearer credentials and refreshes them
/// when they expire.
#[derive(Clone)]
pub struct AuthenticatedClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("http", &self.http)
            .field("tokens", &"dyn TokenSource")
            .finish()
    }
}

impl AuthenticatedClient {
    pub fn new(http: reqwest::Client, tokens: Arc<dyn TokenSource>) -> Self {
        Self { http, tokens }
    }

    /// Send the request produced by `build` with a valid bearer token.
    ///
    /// `build` may run twice: once with the current token and once more
    /// after a refresh if upstream answers `401`.
    pub async fn send<F>(&self, endpoint: &str, build: F) -> Result<reqwest::Response, UpstreamError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut tokens = self
            .tokens
            .current()
            .await
            .map_err(|source| credentials_error(endpoint, source))?;

        if tokens.is_expired_at(Utc::now()) {
            tracing::debug!(endpoint, "stored access token expired, refreshing before request");
            match self.tokens.refresh(&tokens).await {
                Ok(fresh) => tokens = fresh,
                // Let upstream judge the stale token.
                Err(CredentialError::RefreshUnavailable) => {}
                Err(source) => return Err(credentials_error(endpoint, source)),
            }
        }

        let resp = self.dispatch(endpoint, &build, &tokens).await?;
        if resp.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        match self.tokens.refresh(&tokens).await {
            Ok(fresh) => {
                tracing::info!(endpoint, "access token rejected, retrying with refreshed token");
                self.dispatch(endpoint, &build, &fresh).await
            }
            Err(CredentialError::RefreshUnavailable) => Ok(resp),
            Err(source) => Err(credentials_error(endpoint, source)),
        }
    }

    async fn dispatch<F>(
        &self,
        endpoint: &str,
        build: &F,
        tokens: &StoredTokens,
    ) -> Result<reqwest::Response, UpstreamError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        build(&self.http)
            .bearer_auth(tokens.access_token())
            .send()
            .await
            .map_err(|source| UpstreamError::Http {
                endpoint: endpoint.to_string(),
                source,
            })
    }
}

fn credentials_error(endpoint: &str, source: CredentialError) -> UpstreamError {
    UpstreamError::Credentials {
        endpoint: endpoint.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn tokens_without_expiry_never_expire_locally() {
        let tokens = StoredTokens::new("a");
        assert!(!tokens.is_expired_at(Utc::now()));
    }

    #[test]
    fn tokens_expire_at_recorded_instant() {
        let now = Utc::now();
        let tokens = StoredTokens::new("a").with_expiry(now);
        assert!(tokens.is_expired_at(now));
        assert!(!tokens.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn debug_redacts_token_values() {
        let tokens = StoredTokens::new("access-secret").with_refresh_token("refresh-secret");
        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("access-secret"));
        assert!(!rendered.contains("refresh-secret"));
    }

    #[tokio::test]
    async fn static_source_without_token_reports_missing() {
        let source = StaticTokenSource::default();
        assert!(matches!(source.current().await, Err(CredentialError::Missing)));
    }

    #[tokio::test]
    async fn static_source_cannot_refresh() {
        let source = StaticTokenSource::new(Some(StoredTokens::new("a")));
        let current = source.current().await.unwrap();
        assert_eq!(current.access_token(), "a");
        assert!(matches!(
            source.refresh(&current).await,
            Err(CredentialError::RefreshUnavailable)
        ));
    }

    #[test]
    fn static_source_from_config_carries_refresh_token() {
        let mut config = CchConfig::unconfigured("http://127.0.0.1:1".parse().unwrap());
        config.access_token = Some(Zeroizing::new("access".into()));
        config.refresh_token = Some(Zeroizing::new("refresh".into()));
        let source = StaticTokenSource::from_config(&config);
        let tokens = source.tokens.unwrap();
        assert_eq!(tokens.access_token(), "access");
        assert_eq!(tokens.refresh_token(), Some("refresh"));
    }
}
