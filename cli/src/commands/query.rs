//! Query commands

use super::{build_request, expansion_module, module_config};
use crate::config::Config;
use crate::Cli;
use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Read;
use tracing::debug;

pub async fn handle_query(cli: &Cli, attribute_type: &str, value: &str) -> Result<()> {
    let profile = Config::load(cli.profile.as_deref())?;
    let request = build_request(module_config(cli, &profile), attribute_type, value);
    execute(cli, &profile, &request).await
}

pub async fn handle_run(cli: &Cli, file: &str) -> Result<()> {
    let profile = Config::load(cli.profile.as_deref())?;

    let raw = if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file))?
    };

    let request: Value = serde_json::from_str(&raw).context("request is not valid JSON")?;
    execute(cli, &profile, &request).await
}

async fn execute(cli: &Cli, profile: &Config, request: &Value) -> Result<()> {
    let module = expansion_module(cli, profile);
    debug!(?module, "running expansion");

    let response = module.handle(request).await;
    let failed = response.error().map(String::from);
    cli.format.print(&response);

    match failed {
        Some(error) => anyhow::bail!(error),
        None => Ok(()),
    }
}
