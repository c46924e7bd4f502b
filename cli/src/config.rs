//! CLI Configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Keys accepted by `config set|get`
pub const KEYS: [&str; 7] = [
    "api_key",
    "api_url",
    "event_limit",
    "proxy_host",
    "proxy_port",
    "proxy_username",
    "proxy_password",
];

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub event_limit: Option<u32>,
    pub proxy_host: Option<String>,
    pub proxy_port: Option<u16>,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self> {
        Self::load_from(&Self::config_path(profile)?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf> {
        let path = Self::config_path(profile)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        match key {
            "api_key" => self.api_key = Some(value),
            "api_url" => self.api_url = Some(value),
            "event_limit" => {
                self.event_limit = Some(value.parse().context("event_limit must be a number")?)
            }
            "proxy_host" => self.proxy_host = Some(value),
            "proxy_port" => {
                self.proxy_port = Some(value.parse().context("proxy_port must be a port number")?)
            }
            "proxy_username" => self.proxy_username = Some(value),
            "proxy_password" => self.proxy_password = Some(value),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Display value of `key`, secrets masked
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(match key {
            "api_key" => self.api_key.as_deref().map(mask),
            "api_url" => self.api_url.clone(),
            "event_limit" => self.event_limit.map(|v| v.to_string()),
            "proxy_host" => self.proxy_host.clone(),
            "proxy_port" => self.proxy_port.map(|v| v.to_string()),
            "proxy_username" => self.proxy_username.clone(),
            "proxy_password" => self.proxy_password.as_deref().map(|_| "****".to_string()),
            _ => anyhow::bail!("Unknown config key: {}", key),
        })
    }

    fn config_path(profile: Option<&str>) -> Result<PathBuf> {
        let home = dirs::home_dir().context("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".gti-expansion").join(filename))
    }
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(8).collect();
    format!("{}****", visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("api_key", "0123456789abcdef".into()).unwrap();
        config.set("proxy_port", "3128".into()).unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.get("api_key").unwrap().as_deref(), Some("01234567****"));
        assert_eq!(loaded.get("proxy_port").unwrap().as_deref(), Some("3128"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_rejects_unknown_and_malformed() {
        let mut config = Config::default();
        assert!(config.set("tenant_id", "x".into()).is_err());
        assert!(config.set("proxy_port", "not-a-port".into()).is_err());
        assert!(config.get("tenant_id").is_err());
    }
}
