//! # Tax-File Download Proxy
//!
//! Streams one CCH Axcess batch output file back to the caller.
//!
//! The upstream body is forwarded as a byte stream without buffering, with
//! the upstream headers attached verbatim. The response status is always
//! 200 on success, whatever 2xx code upstream used.

use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use relay_upstream::{DownloadRequest, UpstreamError};

use crate::error::{message_or, AppError};
use crate::state::AppState;

const MISSING_PARAMS: &str = "Missing required parameters: batchGuid, batchItemGuid, fileName";

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/tax/download-file", get(download_file))
}

/// Query string of the download route. All three fields are required;
/// they are optional here so absence maps to our own 400 body.
#[derive(Debug, Default)]
pub struct DownloadFileQuery {
    pub batch_guid: Option<String>,
    pub batch_item_guid: Option<String>,
    pub file_name: Option<String>,
}

impl DownloadFileQuery {
    /// Collect the known parameters from decoded pairs. The first occurrence
    /// of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "batchGuid" => &mut query.batch_guid,
                "batchItemGuid" => &mut query.batch_item_guid,
                "fileName" => &mut query.file_name,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    fn into_request(self) -> Result<DownloadRequest, AppError> {
        match (
            non_empty(self.batch_guid),
            non_empty(self.batch_item_guid),
            non_empty(self.file_name),
        ) {
            (Some(batch_guid), Some(batch_item_guid), Some(file_name)) => Ok(DownloadRequest {
                batch_guid,
                batch_item_guid,
                file_name,
            }),
            _ => Err(AppError::BadRequest(MISSING_PARAMS.to_string())),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// GET /v1/tax/download-file: stream a batch output file from CCH Axcess.
#[utoipa::path(
    get,
    path = "/v1/tax/download-file",
    params(
        ("batchGuid" = String, Query, description = "Batch GUID"),
        ("batchItemGuid" = String, Query, description = "Batch item GUID"),
        ("fileName" = String, Query, description = "Output file name"),
    ),
    responses(
        (status = 200, description = "File bytes streamed from CCH Axcess"),
        (status = 400, description = "Missing or refused query parameter", body = crate::error::ErrorBody),
        (status = 500, description = "Configuration, credential or transport failure", body = crate::error::ErrorBody),
        (status = "default", description = "Upstream status mirrored with upstream body in details", body = crate::error::ErrorBody),
    ),
    tag = "tax"
)]
pub async fn download_file(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(pairs) = query.map_err(|err| AppError::BadRequest(err.body_text()))?;
    let req = DownloadFileQuery::from_pairs(pairs).into_request()?;

    tracing::info!(
        batch_guid = %req.batch_guid,
        batch_item_guid = %req.batch_item_guid,
        file_name = %req.file_name,
        "downloading CCH batch output file"
    );

    let upstream = state.cch.download_file(&req).await.map_err(download_error)?;

    let headers = upstream.headers().clone();
    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.headers_mut() = headers;
    Ok(response)
}

fn download_error(err: UpstreamError) -> AppError {
    match err {
        UpstreamError::InvalidFilter(e) => AppError::BadRequest(e.to_string()),
        UpstreamError::MissingConfig(var) => AppError::MissingConfig(var),
        UpstreamError::ApiError { status, body, .. } => {
            tracing::warn!(status, "CCH download rejected by upstream");
            AppError::DownloadFailed { status, body }
        }
        other => AppError::Internal {
            error: message_or(&other, "Failed to download file"),
            details: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(batch: Option<&str>, item: Option<&str>, file: Option<&str>) -> DownloadFileQuery {
        DownloadFileQuery {
            batch_guid: batch.map(str::to_string),
            batch_item_guid: item.map(str::to_string),
            file_name: file.map(str::to_string),
        }
    }

    #[test]
    fn complete_query_becomes_request() {
        let req = query(Some("b"), Some("i"), Some("f")).into_request().unwrap();
        assert_eq!(req.batch_guid, "b");
        assert_eq!(req.batch_item_guid, "i");
        assert_eq!(req.file_name, "f");
    }

    #[test]
    fn each_missing_or_empty_parameter_is_rejected() {
        let cases = [
            query(None, Some("i"), Some("f")),
            query(Some("b"), None, Some("f")),
            query(Some("b"), Some("i"), None),
            query(Some(""), Some("i"), Some("f")),
            DownloadFileQuery::default(),
        ];
        for case in cases {
            assert!(matches!(case.into_request(), Err(AppError::BadRequest(m)) if m == MISSING_PARAMS));
        }
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn repeated_key_keeps_first_value() {
        let query = DownloadFileQuery::from_pairs(pairs(&[
            ("batchGuid", "a"),
            ("batchGuid", "b"),
            ("batchItemGuid", "i"),
            ("fileName", "f"),
            ("unrelated", "x"),
        ]));
        assert_eq!(query.batch_guid.as_deref(), Some("a"));
        assert_eq!(query.batch_item_guid.as_deref(), Some("i"));
        assert_eq!(query.file_name.as_deref(), Some("f"));
    }

    #[test]
    fn empty_first_value_is_still_missing() {
        let query = DownloadFileQuery::from_pairs(pairs(&[
            ("batchGuid", ""),
            ("batchGuid", "b"),
            ("batchItemGuid", "i"),
            ("fileName", "f"),
        ]));
        assert!(matches!(query.into_request(), Err(AppError::BadRequest(m)) if m == MISSING_PARAMS));
    }

    #[test]
    fn api_error_maps_to_download_failed() {
        let err = download_error(UpstreamError::ApiError {
            endpoint: "GET /x".into(),
            status: 404,
            body: "gone".into(),
        });
        assert!(matches!(err, AppError::DownloadFailed { status: 404, ref body } if body == "gone"));
    }

    #[test]
    fn missing_key_maps_to_config_error() {
        let err = download_error(UpstreamError::MissingConfig("CCH_SUBSCRIPTION_KEY"));
        assert!(matches!(err, AppError::MissingConfig("CCH_SUBSCRIPTION_KEY")));
    }
}
