//! Module Entry Point
//!
//! Validates a MISP expansion request, runs the lookup and maps every
//! outcome, failures included, onto the module response shape.

use crate::client::{GtiClient, ReportSource, DEFAULT_API_URL, DEFAULT_TIMEOUT};
use crate::config::{ModuleConfig, ProxySettings};
use crate::error::{ExpansionError, Result};
use crate::parser::GtiParser;
use crate::{Attribute, AttributeType};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

const MISSING_APIKEY: &str = "A Google Threat Intelligence api key is required for this module.";
const MISSING_ATTRIBUTE: &str = "This module requires an \"attribute\" field as input, which should contain at least a type, a value and an uuid.";

/// `{"error": ...}` or `{"results": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModuleResponse {
    Error { error: String },
    Results { results: Map<String, Value> },
}

impl ModuleResponse {
    pub fn error(&self) -> Option<&str> {
        match self {
            ModuleResponse::Error { error } => Some(error),
            ModuleResponse::Results { .. } => None,
        }
    }

    pub fn results(&self) -> Option<&Map<String, Value>> {
        match self {
            ModuleResponse::Results { results } => Some(results),
            ModuleResponse::Error { .. } => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            ModuleResponse::Error { error } => serde_json::json!({ "error": error }),
            ModuleResponse::Results { results } => serde_json::json!({ "results": results }),
        }
    }
}

impl From<ExpansionError> for ModuleResponse {
    fn from(err: ExpansionError) -> Self {
        ModuleResponse::Error {
            error: err.to_string(),
        }
    }
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionRequest {
    pub config: ModuleConfig,
    pub attribute: Attribute,
}

impl ExpansionRequest {
    /// Validate a raw request before any lookup happens.
    pub fn from_value(request: &Value) -> Result<Self> {
        let config = match request.get("config") {
            Some(config @ Value::Object(map)) if !map.is_empty() => {
                serde_json::from_value::<ModuleConfig>(config.clone())
                    .map_err(|e| ExpansionError::Configuration(e.to_string()))?
            }
            _ => return Err(ExpansionError::Configuration(MISSING_APIKEY.into())),
        };
        if config.apikey.is_none() {
            return Err(ExpansionError::Configuration(MISSING_APIKEY.into()));
        }

        let attribute = match request.get("attribute") {
            Some(Value::Object(map)) if !map.is_empty() => map,
            _ => return Err(ExpansionError::Input(MISSING_ATTRIBUTE.into())),
        };

        let attribute_type: AttributeType = match attribute.get("type") {
            Some(Value::String(t)) => t.parse()?,
            Some(Value::Null) | None => {
                return Err(ExpansionError::Input(MISSING_ATTRIBUTE.into()))
            }
            Some(_) => return Err(ExpansionError::Input("Unsupported attribute type.".into())),
        };

        let value = match attribute.get("value") {
            Some(Value::String(v)) if !v.is_empty() => v.clone(),
            _ => return Err(ExpansionError::Input(MISSING_ATTRIBUTE.into())),
        };

        Ok(Self {
            config,
            attribute: Attribute {
                attribute_type,
                value,
                uuid: attribute
                    .get("uuid")
                    .and_then(Value::as_str)
                    .map(String::from),
            },
        })
    }
}

/// The expansion module, bound to an API endpoint
#[derive(Debug, Clone)]
pub struct ExpansionModule {
    api_url: String,
    timeout: Duration,
}

impl Default for ExpansionModule {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpansionModule {
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Handle a raw request; never fails, errors become `{"error": ...}`.
    pub async fn handle(&self, request: &Value) -> ModuleResponse {
        match self.try_handle(request).await {
            Ok(results) => ModuleResponse::Results { results },
            Err(err) => {
                if err.is_request_error() {
                    debug!(error = %err, "request rejected");
                } else {
                    warn!(error = %err, "enrichment failed");
                }
                err.into()
            }
        }
    }

    async fn try_handle(&self, request: &Value) -> Result<Map<String, Value>> {
        let request = ExpansionRequest::from_value(request)?;
        let limit = request.config.results_limit()?;
        let proxy = ProxySettings::from_config(&request.config)?;

        let client = GtiClient::builder(request.config.apikey.as_deref().unwrap_or_default())
            .base_url(&self.api_url)
            .proxy(proxy)
            .timeout(self.timeout)
            .build()?;

        run(&client, &request.attribute, limit).await
    }
}

/// Enrich one attribute against `source` and serialize the event.
pub async fn run<S: ReportSource + ?Sized>(
    source: &S,
    attribute: &Attribute,
    limit: u32,
) -> Result<Map<String, Value>> {
    let mut parser = GtiParser::new(source, limit);
    parser.query_api(attribute).await?;
    Ok(parser.results())
}

/// Entry point with the public API endpoint
pub async fn dict_handler(request: &Value) -> Value {
    ExpansionModule::new().handle(request).await.into_value()
}
