//! Typed client for the FormationsCorp business API.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/api/v2/businesses/{accountId}` | Get business account by ID |
//!
//! Authenticated with a static bearer token (`FORMATIONS_AUTH_TOKEN`).

use url::Url;
use zeroize::Zeroizing;

use crate::config::FormationsConfig;
use crate::error::UpstreamError;

/// Client for the FormationsCorp API.
#[derive(Clone)]
pub struct FormationsClient {
    http: reqwest::Client,
    base_url: Url,
    auth_token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for FormationsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormationsClient")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl FormationsClient {
    pub fn new(config: &FormationsConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            http: crate::http_client(config.timeout_secs)?,
            base_url: config.base_url.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    /// Whether the bearer token is present.
    pub fn is_configured(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Fetch a business account as raw JSON.
    ///
    /// Calls `GET {base_url}/api/v2/businesses/{account_id}`. The payload is
    /// returned without schema validation.
    pub async fn get_business(&self, account_id: &str) -> Result<serde_json::Value, UpstreamError> {
        let endpoint = "GET /api/v2/businesses/{accountId}";
        let token = self
            .auth_token
            .as_ref()
            .ok_or(UpstreamError::MissingConfig("FORMATIONS_AUTH_TOKEN"))?;
        let url = self.business_url(account_id)?;

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| UpstreamError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.map_err(|e| UpstreamError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
            return Err(UpstreamError::ApiError {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        resp.json().await.map_err(|e| UpstreamError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })
    }

    fn business_url(&self, account_id: &str) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl {
                endpoint: "/api/v2/businesses".into(),
                reason: format!("{} cannot be a base URL", self.base_url),
            })?
            .pop_if_empty()
            .extend(["api", "v2", "businesses", account_id]);
        Ok(url)
    }
}
