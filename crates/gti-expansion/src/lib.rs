//! Google Threat Intelligence Expansion Module
//!
//! Enriches MISP observables (domains, IPs, hashes, URLs) with the Google
//! Threat Intelligence assessment of each one, expressed as MISP objects.
//!
//! # Flow
//! ```text
//!   request ──► validate ──► client (+ proxy) ──► dispatch by type
//!                                                       │
//!        ┌──────────────┬───────────────┬───────────────┤
//!        ▼              ▼               ▼               ▼
//!   /ip_addresses    /domains        /files          /urls/{id}
//!        └──────────────┴───────┬───────┴───────────────┘
//!                               ▼
//!          observable object ──analyzed-with──► report object
//!                               │
//!                               ▼
//!                    {"results": {"Object": [...]}}
//! ```
//!
//! # Example
//! ```no_run
//! # async fn run() {
//! let response = gti_expansion::dict_handler(&serde_json::json!({
//!     "config": {"apikey": "<key>"},
//!     "attribute": {"type": "domain", "value": "example.com", "uuid": "..."}
//! }))
//! .await;
//! println!("{}", response);
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod misp;
pub mod parser;
pub mod report;

pub use client::{GtiClient, ReportSource};
pub use config::{ModuleConfig, ProxySettings, DEFAULT_RESULTS_LIMIT};
pub use error::{ExpansionError, Result};
pub use handler::{dict_handler, ExpansionModule, ExpansionRequest, ModuleResponse};
pub use misp::{MispEvent, MispObject};
pub use parser::GtiParser;
pub use report::Report;

// =============================================================================
// Attribute Types
// =============================================================================

/// MISP attribute types accepted as input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "hostname")]
    Hostname,
    #[serde(rename = "domain")]
    Domain,
    #[serde(rename = "ip-src")]
    IpSrc,
    #[serde(rename = "ip-dst")]
    IpDst,
    #[serde(rename = "md5")]
    Md5,
    #[serde(rename = "sha1")]
    Sha1,
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "url")]
    Url,
}

impl AttributeType {
    pub const ALL: [AttributeType; 8] = [
        AttributeType::Hostname,
        AttributeType::Domain,
        AttributeType::IpSrc,
        AttributeType::IpDst,
        AttributeType::Md5,
        AttributeType::Sha1,
        AttributeType::Sha256,
        AttributeType::Url,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::Hostname => "hostname",
            AttributeType::Domain => "domain",
            AttributeType::IpSrc => "ip-src",
            AttributeType::IpDst => "ip-dst",
            AttributeType::Md5 => "md5",
            AttributeType::Sha1 => "sha1",
            AttributeType::Sha256 => "sha256",
            AttributeType::Url => "url",
        }
    }

    /// Lookup routine responsible for this type
    pub fn kind(&self) -> ObservableKind {
        match self {
            AttributeType::IpSrc | AttributeType::IpDst => ObservableKind::Ip,
            AttributeType::Domain | AttributeType::Hostname => ObservableKind::Domain,
            AttributeType::Md5 | AttributeType::Sha1 | AttributeType::Sha256 => {
                ObservableKind::Hash
            }
            AttributeType::Url => ObservableKind::Url,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeType {
    type Err = ExpansionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        AttributeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ExpansionError::Input("Unsupported attribute type.".into()))
    }
}

/// Kind of observable, one per API collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservableKind {
    Ip,
    Domain,
    Hash,
    Url,
}

impl ObservableKind {
    /// API path of the report for `value`
    pub fn api_path(&self, value: &str) -> String {
        match self {
            ObservableKind::Ip => format!("/ip_addresses/{}", value),
            ObservableKind::Domain => format!("/domains/{}", value),
            ObservableKind::Hash => format!("/files/{}", value),
            ObservableKind::Url => format!("/urls/{}", client::url_id(value)),
        }
    }
}

/// Input attribute of an expansion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl Attribute {
    pub fn new(attribute_type: AttributeType, value: impl Into<String>) -> Self {
        Self {
            attribute_type,
            value: value.into(),
            uuid: None,
        }
    }
}

// =============================================================================
// Module Metadata
// =============================================================================

/// Input format expected by the module
pub const INPUT_FORMAT: &str = "misp_standard";
pub const MODULE_VERSION: &str = "1";
pub const MODULE_AUTHOR: &str = "Google Threat Intelligence team";
pub const MODULE_DESCRIPTION: &str =
    "An expansion module to have the observable's threat score assessed by Google Threat Intelligence.";
/// Settings the module reads from its config
pub const CONFIG_OPTIONS: [&str; 6] = [
    "apikey",
    "event_limit",
    "proxy_host",
    "proxy_port",
    "proxy_username",
    "proxy_password",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Introspection {
    pub input: Vec<AttributeType>,
    pub format: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub version: &'static str,
    pub author: &'static str,
    pub description: &'static str,
    #[serde(rename = "module-type")]
    pub module_type: Vec<&'static str>,
    pub config: Vec<&'static str>,
}

/// Supported input types and format
pub fn introspection() -> Introspection {
    Introspection {
        input: AttributeType::ALL.to_vec(),
        format: INPUT_FORMAT,
    }
}

/// Static module metadata
pub fn version() -> ModuleInfo {
    ModuleInfo {
        version: MODULE_VERSION,
        author: MODULE_AUTHOR,
        description: MODULE_DESCRIPTION,
        module_type: vec!["expansion"],
        config: CONFIG_OPTIONS.to_vec(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_table() {
        assert_eq!(AttributeType::IpSrc.kind(), ObservableKind::Ip);
        assert_eq!(AttributeType::IpDst.kind(), ObservableKind::Ip);
        assert_eq!(AttributeType::Domain.kind(), ObservableKind::Domain);
        assert_eq!(AttributeType::Hostname.kind(), ObservableKind::Domain);
        assert_eq!(AttributeType::Md5.kind(), ObservableKind::Hash);
        assert_eq!(AttributeType::Sha1.kind(), ObservableKind::Hash);
        assert_eq!(AttributeType::Sha256.kind(), ObservableKind::Hash);
        assert_eq!(AttributeType::Url.kind(), ObservableKind::Url);
    }

    #[test]
    fn test_parse_attribute_type() {
        for t in AttributeType::ALL {
            assert_eq!(t.as_str().parse::<AttributeType>().unwrap(), t);
        }

        let err = "email-src".parse::<AttributeType>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported attribute type.");
    }

    #[test]
    fn test_api_paths() {
        assert_eq!(ObservableKind::Ip.api_path("8.8.8.8"), "/ip_addresses/8.8.8.8");
        assert_eq!(ObservableKind::Domain.api_path("qexyhuv.com"), "/domains/qexyhuv.com");
        assert_eq!(ObservableKind::Hash.api_path("abc"), "/files/abc");
        assert_eq!(
            ObservableKind::Url.api_path("http://example.com/"),
            "/urls/aHR0cDovL2V4YW1wbGUuY29tLw"
        );
    }

    #[test]
    fn test_metadata() {
        let intro = serde_json::to_value(introspection()).unwrap();
        assert_eq!(intro["format"], "misp_standard");
        assert_eq!(intro["input"].as_array().unwrap().len(), 8);
        assert_eq!(intro["input"][2], "ip-src");

        let info = serde_json::to_value(version()).unwrap();
        assert_eq!(info["version"], "1");
        assert_eq!(info["module-type"][0], "expansion");
        assert_eq!(info["config"][5], "proxy_password");
    }
}
