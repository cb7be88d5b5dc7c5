use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable that overrides `upstream.api_key`.
pub const API_KEY_ENV: &str = "RAPIDAPI_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub host: String,
    pub api_key: String,
    pub currency_code: String,
    pub cabin_class: String,
    pub default_sort: String,
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://booking-com21.p.rapidapi.com".into(),
            host: "booking-com21.p.rapidapi.com".into(),
            api_key: String::new(),
            currency_code: "GBP".into(),
            cabin_class: "ECONOMY".into(),
            default_sort: "BEST".into(),
            timeout_seconds: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listen_addr: String,
    pub database_path: String,
    /// The one user every saved flight belongs to until real accounts exist.
    pub default_user: String,
    pub upstream: UpstreamConfig,
    /// Fixed seed for the stand-in price history; random when absent.
    pub trend_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".into(),
            database_path: "flights.db".into(),
            default_user: "johndoe".into(),
            upstream: UpstreamConfig::default(),
            trend_seed: None,
        }
    }
}

/// Reads the JSON config at `path`; a missing file means defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let mut config: AppConfig = if path.exists() {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)?
    } else {
        AppConfig::default()
    };

    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            config.upstream.api_key = key;
        }
    }

    Ok(config)
}
