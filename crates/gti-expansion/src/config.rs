//! Module configuration
//!
//! MISP hands every module setting over as a string, so the fields here are
//! deserialized loosely: strings and numbers are both accepted and an empty
//! string counts as unset.

use crate::error::{ExpansionError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Default number of related results requested from the API
pub const DEFAULT_RESULTS_LIMIT: u32 = 10;

/// Settings declared by the module (`apikey`, `event_limit`, `proxy_*`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(default, deserialize_with = "loose_string")]
    pub apikey: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub event_limit: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub proxy_host: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub proxy_port: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub proxy_username: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub proxy_password: Option<String>,
}

impl ModuleConfig {
    pub fn with_apikey(apikey: impl Into<String>) -> Self {
        Self {
            apikey: Some(apikey.into()),
            ..Default::default()
        }
    }

    /// Parsed `event_limit`, falling back to [`DEFAULT_RESULTS_LIMIT`] when
    /// unset or zero.
    pub fn results_limit(&self) -> Result<u32> {
        let Some(raw) = self.event_limit.as_deref() else {
            return Ok(DEFAULT_RESULTS_LIMIT);
        };

        let limit: u32 = raw.trim().parse().map_err(|_| {
            ExpansionError::Configuration(format!(
                "The event_limit config must be a positive integer, got '{}'.",
                raw
            ))
        })?;

        Ok(if limit == 0 { DEFAULT_RESULTS_LIMIT } else { limit })
    }
}

fn loose_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// =============================================================================
// Proxy Settings
// =============================================================================

/// Resolved proxy URLs, one per scheme the client talks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub http: String,
    pub https: String,
}

impl ProxySettings {
    /// Build proxy settings from the module config.
    ///
    /// Returns `Ok(None)` when no proxy host is configured.
    pub fn from_config(config: &ModuleConfig) -> Result<Option<Self>> {
        let Some(host) = config.proxy_host.as_deref() else {
            return Ok(None);
        };

        let port = config.proxy_port.as_deref().ok_or_else(|| {
            ExpansionError::Configuration(
                "The proxy_host config is set, please also set the proxy_port.".into(),
            )
        })?;

        let (scheme, hostname) = split_proxy_host(host)?;
        let mut authority = format!("{}:{}", hostname, port);

        if let Some(username) = config.proxy_username.as_deref() {
            let password = config.proxy_password.as_deref().ok_or_else(|| {
                ExpansionError::Configuration(
                    "The proxy_username config is set, please also set the proxy_password."
                        .into(),
                )
            })?;
            authority = format!("{}:{}@{}", username, password, authority);
        }

        let proxy_url = format!("{}://{}", scheme, authority);
        Ok(Some(Self {
            http: proxy_url.clone(),
            https: proxy_url,
        }))
    }
}

/// Split a configured proxy host into `(scheme, hostname)`.
///
/// Any http-like scheme collapses to `http`; other schemes (`socks5`, ...)
/// are kept. A host without a scheme is a bare authority.
fn split_proxy_host(host: &str) -> Result<(String, String)> {
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };

    let parsed = Url::parse(&with_scheme).map_err(|e| {
        ExpansionError::Configuration(format!("Invalid proxy_host '{}': {}", host, e))
    })?;

    let hostname = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| {
            ExpansionError::Configuration(format!("Invalid proxy_host '{}': missing host", host))
        })?
        .to_string();

    let scheme = if parsed.scheme().contains("http") {
        "http".to_string()
    } else {
        parsed.scheme().to_string()
    };

    Ok((scheme, hostname))
}
