//! # relay-api -- Axum proxy for third-party vendor APIs
//!
//! Two stateless proxy routes, each forwarding exactly one upstream request:
//!
//! | Route | Module | Upstream |
//! |-------|--------|----------|
//! | `GET /v1/tax/download-file` | [`routes::tax_documents`] | CCH Axcess batch output download |
//! | `GET /v1/formations/accounts/:account_id` | [`routes::formations`] | FormationsCorp `/api/v2/businesses` |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → Handler
//! ```
//!
//! Health probes (`/health/*`) sit outside the trace layer.

pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::tax_documents::router())
        .merge(routes::formations::router())
        .merge(openapi::router())
        .layer(middleware::tracing_layer::layer())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe. Always 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. The relay holds no connections to warm up.
async fn readiness() -> &'static str {
    "ready"
}
