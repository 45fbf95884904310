//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every failure is rendered as a flat JSON body `{ error, status?, details? }`
//! with absent fields omitted.
//!
//! | Variant | Status | Body |
//! |---------|--------|------|
//! | `BadRequest` | 400 | `error` |
//! | `MissingConfig` | 500 | `error` |
//! | `DownloadFailed` | upstream | `error`, `status`, `details` (upstream body) |
//! | `UpstreamStatus` | upstream | `error` |
//! | `Internal` | 500 | `error`, optional `details` |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
    /// Upstream HTTP status, echoed by the download proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Diagnostic detail: upstream body text or the underlying error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Required input missing or refused (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A required secret is absent from configuration (500).
    #[error("{0} is not configured")]
    MissingConfig(&'static str),

    /// Upstream file download answered non-2xx; status and body are echoed.
    #[error("download failed with upstream status {status}")]
    DownloadFailed { status: u16, body: String },

    /// Upstream answered non-2xx; only the status is mirrored.
    #[error("{message} (upstream status {status})")]
    UpstreamStatus { status: u16, message: &'static str },

    /// Transport, decoding, or any other unexpected failure (500).
    #[error("{error}")]
    Internal {
        error: String,
        details: Option<String>,
    },
}

impl AppError {
    /// Return the HTTP status code for this error.
    ///
    /// Upstream statuses outside the valid range fall back to 502.
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingConfig(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DownloadFailed { status, .. } | Self::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }

    fn into_body(self) -> ErrorBody {
        match self {
            Self::BadRequest(message) => ErrorBody {
                error: message,
                status: None,
                details: None,
            },
            Self::MissingConfig(var) => ErrorBody {
                error: format!("{var} is not configured"),
                status: None,
                details: None,
            },
            Self::DownloadFailed { status, body } => ErrorBody {
                error: "Download failed".to_string(),
                status: Some(status),
                details: Some(body),
            },
            Self::UpstreamStatus { message, .. } => ErrorBody {
                error: message.to_string(),
                status: None,
                details: None,
            },
            Self::Internal { error, details } => ErrorBody {
                error,
                status: None,
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(self.into_body())).into_response()
    }
}

/// Render `err` for a client, substituting `fallback` when it renders empty.
pub fn message_or(err: &dyn std::error::Error, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("")]
    struct Silent;

    fn body_json(err: AppError) -> serde_json::Value {
        serde_json::to_value(err.into_body()).unwrap()
    }

    #[test]
    fn bad_request_status_code() {
        let err = AppError::BadRequest("missing".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(err), serde_json::json!({"error": "missing"}));
    }

    #[test]
    fn missing_config_names_variable() {
        let err = AppError::MissingConfig("CCH_SUBSCRIPTION_KEY");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(err),
            serde_json::json!({"error": "CCH_SUBSCRIPTION_KEY is not configured"})
        );
    }

    #[test]
    fn download_failed_echoes_status_and_body() {
        let err = AppError::DownloadFailed {
            status: 404,
            body: "no such file".into(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(err),
            serde_json::json!({"error": "Download failed", "status": 404, "details": "no such file"})
        );
    }

    #[test]
    fn upstream_status_omits_details() {
        let err = AppError::UpstreamStatus {
            status: 503,
            message: "Failed to fetch business data",
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(err),
            serde_json::json!({"error": "Failed to fetch business data"})
        );
    }

    #[test]
    fn invalid_upstream_status_falls_back_to_bad_gateway() {
        let err = AppError::UpstreamStatus {
            status: 1000,
            message: "x",
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn internal_keeps_optional_details() {
        let err = AppError::Internal {
            error: "Internal server error".into(),
            details: Some("connection reset".into()),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(err),
            serde_json::json!({"error": "Internal server error", "details": "connection reset"})
        );
    }

    #[test]
    fn message_or_uses_fallback_for_empty_message() {
        assert_eq!(message_or(&Silent, "Unknown error"), "Unknown error");
        let err = AppError::BadRequest("x".into());
        assert_eq!(message_or(&err, "Unknown error"), "bad request: x");
    }
}
