//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented proxy routes into one OpenAPI document
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vendor Relay API",
        version = "0.1.0",
        description = "Proxy endpoints for CCH Axcess tax-file downloads and FormationsCorp business accounts.",
        license(name = "BUSL-1.1")
    ),
    paths(
        crate::routes::tax_documents::download_file,
        crate::routes::formations::get_account,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::routes::formations::AccountEnvelope,
        crate::routes::formations::AccountData,
        crate::routes::formations::AccountMetadata,
    )),
    tags(
        (name = "tax", description = "CCH Axcess batch output download proxy"),
        (name = "formations", description = "FormationsCorp business account proxy"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
