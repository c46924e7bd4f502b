//! Google Threat Intelligence API Client
//!
//! Thin wrapper over the VirusTotal v3 object endpoints.

use crate::config::ProxySettings;
use crate::error::{ExpansionError, Result};
use crate::report::Report;
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Public API endpoint
pub const DEFAULT_API_URL: &str = "https://www.virustotal.com/api/v3";
/// Tool identifier sent with every request
pub const TOOL_HEADER: &str = "MISPModuleGTIExpansion";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Anything able to fetch one report by API path
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Fetch the object at `path` (e.g. `/files/<hash>`).
    async fn get_object(&self, path: &str) -> Result<Report>;
}

/// URL identifier used by the `/urls/{id}` endpoint
pub fn url_id(url: &str) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(url)
}

pub struct GtiClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    message: String,
}

impl GtiClient {
    /// Create a client against [`DEFAULT_API_URL`].
    pub fn new(api_key: &str, proxy: Option<&ProxySettings>) -> Result<Self> {
        Self::builder(api_key).proxy(proxy.cloned()).build()
    }

    pub fn builder(api_key: &str) -> GtiClientBuilder {
        GtiClientBuilder {
            api_key: api_key.to_string(),
            base_url: DEFAULT_API_URL.to_string(),
            proxy: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    async fn error_from_response(response: reqwest::Response) -> ExpansionError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => ExpansionError::api(envelope.error.code, envelope.error.message),
            Err(_) => ExpansionError::api(status.as_str(), format!("{}: {}", status, text)),
        }
    }
}

#[async_trait]
impl ReportSource for GtiClient {
    async fn get_object(&self, path: &str) -> Result<Report> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "fetching report");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let err = Self::error_from_response(response).await;
            warn!(path, error = %err, "lookup failed");
            return Err(err);
        }

        let body: serde_json::Value = response.json().await?;
        Report::from_response(body)
    }
}

/// Builder for [`GtiClient`]
pub struct GtiClientBuilder {
    api_key: String,
    base_url: String,
    proxy: Option<ProxySettings>,
    timeout: Duration,
}

impl GtiClientBuilder {
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn proxy(mut self, proxy: Option<ProxySettings>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<GtiClient> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-apikey",
            HeaderValue::from_str(&self.api_key).map_err(|e| {
                ExpansionError::Configuration(format!("Invalid API key: {}", e))
            })?,
        );
        headers.insert("x-tool", HeaderValue::from_static(TOOL_HEADER));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout);

        if let Some(proxy) = &self.proxy {
            let proxy = reqwest::Proxy::all(&proxy.http).map_err(|e| {
                ExpansionError::Configuration(format!("Invalid proxy settings: {}", e))
            })?;
            builder = builder.proxy(proxy);
        }

        Ok(GtiClient {
            client: builder.build()?,
            base_url: self.base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_id_is_unpadded_urlsafe_base64() {
        assert_eq!(url_id("http://example.com/"), "aHR0cDovL2V4YW1wbGUuY29tLw");
        assert_eq!(url_id("http://a.b/?x=>"), "aHR0cDovL2EuYi8_eD0-");
    }

    #[test]
    fn test_invalid_api_key_rejected() {
        let err = GtiClient::new("bad\nkey", None).err().unwrap();
        assert!(matches!(err, ExpansionError::Configuration(_)));
    }

    #[test]
    fn test_proxy_applied() {
        let proxy = ProxySettings {
            http: "http://alice:pw@proxy.local:3128".into(),
            https: "http://alice:pw@proxy.local:3128".into(),
        };
        assert!(GtiClient::new("key", Some(&proxy)).is_ok());
    }

    #[test]
    fn test_socks_proxy_applied() {
        let proxy = ProxySettings {
            http: "socks5://127.0.0.1:1080".into(),
            https: "socks5://127.0.0.1:1080".into(),
        };
        assert!(GtiClient::new("key", Some(&proxy)).is_ok());
    }

    #[tokio::test]
    async fn test_get_object_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/domains/example.com"))
            .and(header("x-apikey", "secret"))
            .and(header("x-tool", TOOL_HEADER))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"id": "example.com", "type": "domain", "attributes": {}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GtiClient::builder("secret").base_url(&server.uri()).build().unwrap();
        let report = client.get_object("/domains/example.com").await.unwrap();
        assert_eq!(report.id(), "example.com");
        assert_eq!(report.object_type(), "domain");
    }

    #[tokio::test]
    async fn test_api_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/deadbeef"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": "NotFoundError", "message": "File \"deadbeef\" not found"}
            })))
            .mount(&server)
            .await;

        let client = GtiClient::builder("secret").base_url(&server.uri()).build().unwrap();
        let err = client.get_object("/files/deadbeef").await.unwrap_err();
        match err {
            ExpansionError::Api { code, message } => {
                assert_eq!(code, "NotFoundError");
                assert_eq!(message, "File \"deadbeef\" not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = GtiClient::builder("secret").base_url(&server.uri()).build().unwrap();
        let err = client.get_object("/ip_addresses/1.2.3.4").await.unwrap_err();
        assert_eq!(err.to_string(), "503 Service Unavailable: upstream down");
    }
}
