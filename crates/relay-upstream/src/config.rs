//! Upstream client configuration.
//!
//! Read once at startup. Vendor secrets are optional at load time: an
//! unconfigured vendor only disables its own proxy route, and the client
//! reports the missing secret on every call without touching the network.

use std::str::FromStr;

use url::Url;
use zeroize::Zeroizing;

use crate::cch::FilterQuotePolicy;

/// Production base URL of the CCH Axcess API.
pub const DEFAULT_CCH_BASE_URL: &str = "https://api.cchaxcess.com";

/// Production base URL of the FormationsCorp API.
pub const DEFAULT_FORMATIONS_BASE_URL: &str = "https://api.formationscorp.com";

/// Configuration for both upstream vendors.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub cch: CchConfig,
    pub formations: FormationsConfig,
}

/// CCH Axcess (tax-compliance vendor) settings.
///
/// Custom `Debug` implementation redacts every secret field.
#[derive(Clone)]
pub struct CchConfig {
    pub base_url: Url,
    /// Value of the `IntegratorKey` header. Env: `CCH_SUBSCRIPTION_KEY`.
    pub subscription_key: Option<Zeroizing<String>>,
    /// Seed access token for [`crate::StaticTokenSource`].
    pub access_token: Option<Zeroizing<String>>,
    pub refresh_token: Option<Zeroizing<String>>,
    pub filter_quotes: FilterQuotePolicy,
    /// Client-wide request timeout. `None` leaves reqwest's default (no timeout).
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for CchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CchConfig")
            .field("base_url", &self.base_url)
            .field("subscription_key", &redacted(&self.subscription_key))
            .field("access_token", &redacted(&self.access_token))
            .field("refresh_token", &redacted(&self.refresh_token))
            .field("filter_quotes", &self.filter_quotes)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// FormationsCorp (corporate-formations vendor) settings.
#[derive(Clone)]
pub struct FormationsConfig {
    pub base_url: Url,
    /// Static bearer token. Env: `FORMATIONS_AUTH_TOKEN`.
    pub auth_token: Option<Zeroizing<String>>,
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for FormationsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormationsConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &redacted(&self.auth_token))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn redacted(secret: &Option<Zeroizing<String>>) -> &'static str {
    match secret {
        Some(_) => "[REDACTED]",
        None => "<unset>",
    }
}

impl UpstreamConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CCH_BASE_URL` (default: `https://api.cchaxcess.com`)
    /// - `CCH_SUBSCRIPTION_KEY`, `CCH_ACCESS_TOKEN`, `CCH_REFRESH_TOKEN` (optional)
    /// - `CCH_FILTER_QUOTES` (`verbatim` | `escape` | `reject`, default `verbatim`)
    /// - `FORMATIONS_BASE_URL` (default: `https://api.formationscorp.com`)
    /// - `FORMATIONS_AUTH_TOKEN` (optional)
    /// - `UPSTREAM_TIMEOUT_SECS` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let timeout_secs = lookup("UPSTREAM_TIMEOUT_SECS").and_then(|s| s.parse().ok());

        let filter_quotes = match lookup("CCH_FILTER_QUOTES") {
            Some(raw) => raw
                .parse::<FilterQuotePolicy>()
                .map_err(|_| ConfigError::InvalidValue("CCH_FILTER_QUOTES".to_string(), raw))?,
            None => FilterQuotePolicy::default(),
        };

        Ok(Self {
            cch: CchConfig {
                base_url: lookup_url(&lookup, "CCH_BASE_URL", DEFAULT_CCH_BASE_URL)?,
                subscription_key: lookup_secret(&lookup, "CCH_SUBSCRIPTION_KEY"),
                access_token: lookup_secret(&lookup, "CCH_ACCESS_TOKEN"),
                refresh_token: lookup_secret(&lookup, "CCH_REFRESH_TOKEN"),
                filter_quotes,
                timeout_secs,
            },
            formations: FormationsConfig {
                base_url: lookup_url(&lookup, "FORMATIONS_BASE_URL", DEFAULT_FORMATIONS_BASE_URL)?,
                auth_token: lookup_secret(&lookup, "FORMATIONS_AUTH_TOKEN"),
                timeout_secs,
            },
        })
    }
}

impl CchConfig {
    /// Configuration pointing at `base_url` with no secrets set.
    pub fn unconfigured(base_url: Url) -> Self {
        Self {
            base_url,
            subscription_key: None,
            access_token: None,
            refresh_token: None,
            filter_quotes: FilterQuotePolicy::default(),
            timeout_secs: None,
        }
    }
}

impl FormationsConfig {
    /// Configuration pointing at `base_url` with no token set.
    pub fn unconfigured(base_url: Url) -> Self {
        Self {
            base_url,
            auth_token: None,
            timeout_secs: None,
        }
    }
}

fn lookup_url(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: &str,
) -> Result<Url, ConfigError> {
    let raw = lookup(var).unwrap_or_else(|| default.to_string());
    Url::from_str(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

// Empty values count as unset.
fn lookup_secret(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<Zeroizing<String>> {
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .map(Zeroizing::new)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = UpstreamConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.cch.base_url.as_str(), "https://api.cchaxcess.com/");
        assert_eq!(cfg.formations.base_url.as_str(), "https://api.formationscorp.com/");
        assert!(cfg.cch.subscription_key.is_none());
        assert!(cfg.cch.access_token.is_none());
        assert!(cfg.formations.auth_token.is_none());
        assert_eq!(cfg.cch.filter_quotes, FilterQuotePolicy::Verbatim);
        assert_eq!(cfg.cch.timeout_secs, None);
    }

    #[test]
    fn reads_secrets_and_overrides() {
        let cfg = UpstreamConfig::from_lookup(lookup_from(&[
            ("CCH_BASE_URL", "http://127.0.0.1:9100"),
            ("CCH_SUBSCRIPTION_KEY", "sub-key"),
            ("CCH_ACCESS_TOKEN", "access"),
            ("CCH_FILTER_QUOTES", "escape"),
            ("FORMATIONS_AUTH_TOKEN", "formations-token"),
            ("UPSTREAM_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(cfg.cch.base_url.as_str(), "http://127.0.0.1:9100/");
        assert_eq!(cfg.cch.subscription_key.as_deref().map(String::as_str), Some("sub-key"));
        assert_eq!(cfg.cch.access_token.as_deref().map(String::as_str), Some("access"));
        assert_eq!(cfg.cch.filter_quotes, FilterQuotePolicy::Escape);
        assert_eq!(
            cfg.formations.auth_token.as_deref().map(String::as_str),
            Some("formations-token")
        );
        assert_eq!(cfg.formations.timeout_secs, Some(15));
    }

    #[test]
    fn blank_secret_counts_as_unset() {
        let cfg =
            UpstreamConfig::from_lookup(lookup_from(&[("FORMATIONS_AUTH_TOKEN", "  ")])).unwrap();
        assert!(cfg.formations.auth_token.is_none());
    }

    #[test]
    fn rejects_invalid_url() {
        let result = UpstreamConfig::from_lookup(lookup_from(&[("CCH_BASE_URL", "not a url")]));
        assert!(matches!(result, Err(ConfigError::InvalidUrl(var, _)) if var == "CCH_BASE_URL"));
    }

    #[test]
    fn rejects_unknown_quote_policy() {
        let result = UpstreamConfig::from_lookup(lookup_from(&[("CCH_FILTER_QUOTES", "strip")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(var, _)) if var == "CCH_FILTER_QUOTES"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = UpstreamConfig::from_lookup(lookup_from(&[
            ("CCH_SUBSCRIPTION_KEY", "super-secret-key"),
            ("FORMATIONS_AUTH_TOKEN", "super-secret-token"),
        ]))
        .unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
