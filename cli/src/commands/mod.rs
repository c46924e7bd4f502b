//! CLI Commands

pub mod config;
pub mod query;

use crate::config::Config;
use crate::Cli;
use gti_expansion::ExpansionModule;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Module config map, flags taking precedence over the profile file
pub fn module_config(cli: &Cli, profile: &Config) -> Map<String, Value> {
    let mut config = Map::new();

    let mut put = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            config.insert(key.to_string(), Value::String(value));
        }
    };

    put("apikey", cli.api_key.clone().or_else(|| profile.api_key.clone()));
    put(
        "event_limit",
        cli.event_limit.or(profile.event_limit).map(|v| v.to_string()),
    );
    put(
        "proxy_host",
        cli.proxy_host.clone().or_else(|| profile.proxy_host.clone()),
    );
    put(
        "proxy_port",
        cli.proxy_port.or(profile.proxy_port).map(|v| v.to_string()),
    );
    put(
        "proxy_username",
        cli.proxy_username.clone().or_else(|| profile.proxy_username.clone()),
    );
    put(
        "proxy_password",
        cli.proxy_password.clone().or_else(|| profile.proxy_password.clone()),
    );

    config
}

/// Module bound to the flag URL, or the profile URL when the flag is default
pub fn expansion_module(cli: &Cli, profile: &Config) -> ExpansionModule {
    let api_url = match &profile.api_url {
        Some(url) if cli.api_url == gti_expansion::client::DEFAULT_API_URL => url.as_str(),
        _ => cli.api_url.as_str(),
    };

    ExpansionModule::new()
        .with_api_url(api_url)
        .with_timeout(Duration::from_secs(cli.timeout))
}

/// Request for a single observable
pub fn build_request(config: Map<String, Value>, attribute_type: &str, value: &str) -> Value {
    json!({
        "config": config,
        "attribute": {"type": attribute_type, "value": value},
    })
}
