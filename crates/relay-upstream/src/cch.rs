//! Typed client for the CCH Axcess batch output download API.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/taxservices/oiptax/api/v1/BatchOutputDownloadFile?$filter=...` | Download one batch output file |
//!
//! The file is selected with an OData `$filter` over `BatchGuid`,
//! `BatchItemGuid` and `FileName`. Requests carry the integrator key header
//! and an OAuth bearer token supplied by [`AuthenticatedClient`].

use std::str::FromStr;
use std::sync::Arc;

use url::Url;
use zeroize::Zeroizing;

use crate::config::CchConfig;
use crate::credentials::{AuthenticatedClient, TokenSource};
use crate::error::UpstreamError;

const DOWNLOAD_PATH: &str = "taxservices/oiptax/api/v1/BatchOutputDownloadFile";

/// Header carrying the CCH integrator (subscription) key.
pub const INTEGRATOR_KEY_HEADER: &str = "IntegratorKey";

/// How single quotes inside filter values are treated.
///
/// OData string literals are delimited by `'`, so a raw quote in a value
/// ends the literal early and lets the caller extend the filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterQuotePolicy {
    /// Interpolate values as received.
    #[default]
    Verbatim,
    /// Double each quote (`'` becomes `''`).
    Escape,
    /// Refuse values that contain a quote.
    Reject,
}

impl FromStr for FilterQuotePolicy {
    type Err = UnknownQuotePolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verbatim" => Ok(Self::Verbatim),
            "escape" => Ok(Self::Escape),
            "reject" => Ok(Self::Reject),
            _ => Err(UnknownQuotePolicy(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown filter quote policy: {0}")]
pub struct UnknownQuotePolicy(pub String);

/// A filter value was refused under [`FilterQuotePolicy::Reject`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Parameter {parameter} must not contain single quotes")]
pub struct FilterError {
    pub parameter: &'static str,
}

/// Identifies one file inside a CCH batch output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub batch_guid: String,
    pub batch_item_guid: String,
    pub file_name: String,
}

impl DownloadRequest {
    /// Render the OData `$filter` expression selecting this file.
    pub fn odata_filter(&self, policy: FilterQuotePolicy) -> Result<String, FilterError> {
        let batch_guid = quote_value("batchGuid", &self.batch_guid, policy)?;
        let batch_item_guid = quote_value("batchItemGuid", &self.batch_item_guid, policy)?;
        let file_name = quote_value("fileName", &self.file_name, policy)?;
        Ok(format!(
            "BatchGuid eq '{batch_guid}' and BatchItemGuid eq '{batch_item_guid}' and FileName eq '{file_name}'"
        ))
    }
}

fn quote_value(
    parameter: &'static str,
    value: &str,
    policy: FilterQuotePolicy,
) -> Result<String, FilterError> {
    match policy {
        FilterQuotePolicy::Verbatim => Ok(value.to_string()),
        FilterQuotePolicy::Escape => Ok(value.replace('\'', "''")),
        FilterQuotePolicy::Reject if value.contains('\'') => Err(FilterError { parameter }),
        FilterQuotePolicy::Reject => Ok(value.to_string()),
    }
}

/// Client for the CCH Axcess download endpoint.
#[derive(Debug, Clone)]
pub struct CchClient {
    auth: AuthenticatedClient,
    base_url: Url,
    subscription_key: Option<Zeroizing<String>>,
    filter_quotes: FilterQuotePolicy,
}

impl CchClient {
    pub fn new(config: &CchConfig, tokens: Arc<dyn TokenSource>) -> Result<Self, UpstreamError> {
        let http = crate::http_client(config.timeout_secs)?;
        Ok(Self {
            auth: AuthenticatedClient::new(http, tokens),
            base_url: config.base_url.clone(),
            subscription_key: config.subscription_key.clone(),
            filter_quotes: config.filter_quotes,
        })
    }

    /// Whether the integrator key is present.
    pub fn is_configured(&self) -> bool {
        self.subscription_key.is_some()
    }

    /// Request one batch output file.
    ///
    /// Returns the upstream response untouched on any 2xx status so the
    /// caller can stream its body. Non-2xx responses are drained into
    /// [`UpstreamError::ApiError`] with the body text preserved.
    ///
    /// Filter and configuration checks run before any network I/O.
    pub async fn download_file(
        &self,
        req: &DownloadRequest,
    ) -> Result<reqwest::Response, UpstreamError> {
        let endpoint = "GET /BatchOutputDownloadFile";
        let filter = req.odata_filter(self.filter_quotes)?;
        let key = self
            .subscription_key
            .as_ref()
            .ok_or(UpstreamError::MissingConfig("CCH_SUBSCRIPTION_KEY"))?;
        let url = self.download_url(&filter)?;

        tracing::debug!(batch_guid = %req.batch_guid, file_name = %req.file_name, "requesting CCH batch output file");

        let resp = self
            .auth
            .send(endpoint, |http| {
                http.get(url.clone())
                    .header(reqwest::header::CACHE_CONTROL, "no-cache")
                    .header(INTEGRATOR_KEY_HEADER, key.as_str())
            })
            .await?;

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

        Ok(resp)
    }

    fn download_url(&self, filter: &str) -> Result<Url, UpstreamError> {
        let raw = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            DOWNLOAD_PATH
        );
        let mut url = Url::parse(&raw).map_err(|e| UpstreamError::InvalidUrl {
            endpoint: DOWNLOAD_PATH.into(),
            reason: e.to_string(),
        })?;
        // Interpolated as-is; the url crate only percent-encodes.
        url.set_query(Some(&format!("$filter={filter}")));
        Ok(url)
    }
}
