//! Upstream client error types.

use crate::credentials::CredentialError;

/// Errors from upstream vendor calls.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// A secret the call needs was not configured. Raised before any I/O.
    #[error("{0} is not configured")]
    MissingConfig(&'static str),
    /// A request value was refused by the filter quote policy. Raised before any I/O.
    #[error(transparent)]
    InvalidFilter(#[from] crate::cch::FilterError),
    /// The authenticated-request capability could not supply credentials.
    #[error("credentials unavailable for {endpoint}: {source}")]
    Credentials {
        endpoint: String,
        source: CredentialError,
    },
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Upstream returned a non-2xx status.
    #[error("upstream {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response body could not be decoded.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Request URL could not be assembled from the base URL.
    #[error("invalid request URL for {endpoint}: {reason}")]
    InvalidUrl { endpoint: String, reason: String },
}

impl UpstreamError {
    /// Upstream HTTP status, for errors that carry one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
