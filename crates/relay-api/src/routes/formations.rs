//! # Account-Data Fetch Proxy
//!
//! Fetches a FormationsCorp business record and wraps it in the account
//! envelope served to callers:
//!
//! ```json
//! {
//!   "success": true,
//!   "accountData": { "data": { ... }, "id": "..." },
//!   "metadata": { "accountId": "...", "retrievedAt": "2026-01-01T00:00:00.000Z" }
//! }
//! ```
//!
//! Upstream failures mirror the upstream status with a fixed message; the
//! upstream body is never echoed.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use relay_upstream::UpstreamError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{message_or, AppError};
use crate::state::AppState;

const ACCOUNT_ID_REQUIRED: &str = "Account ID is required";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/formations/accounts/", get(missing_account_id))
        .route("/v1/formations/accounts/:account_id", get(get_account))
}

/// Envelope around the upstream business payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountEnvelope {
    pub success: bool,
    pub account_data: AccountData,
    pub metadata: AccountMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccountData {
    /// Upstream payload, unmodified.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    /// Top-level `id` of the payload; omitted when upstream has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub id: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetadata {
    pub account_id: String,
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub retrieved_at: String,
}

impl AccountEnvelope {
    pub fn new(account_id: &str, data: serde_json::Value, retrieved_at: DateTime<Utc>) -> Self {
        let id = data.get("id").cloned();
        Self {
            success: true,
            account_data: AccountData { data, id },
            metadata: AccountMetadata {
                account_id: account_id.to_string(),
                retrieved_at: retrieved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        }
    }
}

/// GET /v1/formations/accounts/{account_id}: fetch a business account from FormationsCorp.
#[utoipa::path(
    get,
    path = "/v1/formations/accounts/{account_id}",
    params(("account_id" = String, Path, description = "FormationsCorp business ID")),
    responses(
        (status = 200, description = "Business account wrapped in envelope", body = AccountEnvelope),
        (status = 400, description = "Account ID missing", body = crate::error::ErrorBody),
        (status = 500, description = "Configuration, transport or decoding failure", body = crate::error::ErrorBody),
        (status = "default", description = "Upstream status mirrored", body = crate::error::ErrorBody),
    ),
    tag = "formations"
)]
pub async fn get_account(
    State(state): State<AppState>,
    account_id: Result<Path<String>, PathRejection>,
) -> Result<Json<AccountEnvelope>, AppError> {
    let Path(account_id) = account_id.map_err(|err| AppError::BadRequest(err.body_text()))?;
    if account_id.is_empty() {
        return missing_account_id().await;
    }

    tracing::info!(%account_id, "fetching FormationsCorp business data");

    let data = state
        .formations
        .get_business(&account_id)
        .await
        .map_err(|e| account_error(&account_id, e))?;

    tracing::info!(%account_id, "FormationsCorp business data retrieved");

    Ok(Json(AccountEnvelope::new(&account_id, data, Utc::now())))
}

async fn missing_account_id() -> Result<Json<AccountEnvelope>, AppError> {
    Err(AppError::BadRequest(ACCOUNT_ID_REQUIRED.to_string()))
}

fn account_error(account_id: &str, err: UpstreamError) -> AppError {
    match err {
        UpstreamError::MissingConfig(var) => AppError::MissingConfig(var),
        UpstreamError::ApiError { status, .. } => {
            tracing::warn!(%account_id, status, "FormationsCorp rejected business lookup");
            AppError::UpstreamStatus {
                status,
                message: "Failed to fetch business data",
            }
        }
        other => AppError::Internal {
            error: "Internal server error".to_string(),
            details: Some(message_or(&other, "Unknown error")),
        },
    }
}
