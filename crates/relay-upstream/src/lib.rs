//! # relay-upstream -- Typed clients for the proxied vendor APIs
//!
//! - **CCH Axcess** ([`cch`]): batch output file download, OAuth-protected
//!   through the [`credentials`] capability plus an integrator key header.
//! - **FormationsCorp** ([`formations`]): business account lookup with a
//!   static bearer token.
//!
//! ## Error Model
//!
//! Every call returns [`UpstreamError`]. Configuration and input problems
//! (`MissingConfig`, `InvalidFilter`) are raised before any network I/O;
//! a non-2xx upstream answer becomes `ApiError` carrying status and body
//! text. Clients never retry.

pub mod cch;
pub mod config;
pub mod credentials;
pub mod error;
pub mod formations;

pub use cch::{CchClient, DownloadRequest, FilterQuotePolicy};
pub use config::{CchConfig, ConfigError, FormationsConfig, UpstreamConfig};
pub use credentials::{AuthenticatedClient, CredentialError, StaticTokenSource, StoredTokens, TokenSource};
pub use error::UpstreamError;
pub use formations::FormationsClient;

use std::time::Duration;

/// Build the shared `reqwest::Client` for one vendor.
pub(crate) fn http_client(timeout_secs: Option<u64>) -> Result<reqwest::Client, UpstreamError> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(|e| UpstreamError::Http {
        endpoint: "client_init".into(),
        source: e,
    })
}
