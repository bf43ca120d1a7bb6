use clap::Parser;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::services::sumup_client::SUMUP_BASE_URL;

#[derive(Debug, Parser)]
#[command(name = "sumup-gateway", about = "SumUp checkout endpoints for the ticket shop")]
pub struct Cli {
    /// TOML file with base settings; environment variables take precedence
    #[arg(long, short)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{name} is not an absolute URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_port: u16,
    pub sumup_base_url: String,
    pub access_token: String,
    pub merchant_code: Option<String>,
    pub public_url: String,
    pub http_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            sumup_base_url: SUMUP_BASE_URL.to_string(),
            access_token: String::new(),
            merchant_code: None,
            public_url: "http://localhost:8080".to_string(),
            http_timeout_ms: 10000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|name| env::var(name).ok());
        config
    }

    /// Reads the optional TOML file, applies the environment and validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").and_then(|v| v.parse().ok()) {
            self.server_port = port;
        }
        if let Some(url) = lookup("SUMUP_BASE_URL") {
            self.sumup_base_url = url;
        }
        if let Some(token) = lookup("SUMUP_ACCESS_TOKEN") {
            self.access_token = token;
        }
        if let Some(code) = lookup("SUMUP_MERCHANT_CODE").filter(|v| !v.is_empty()) {
            self.merchant_code = Some(code);
        }
        if let Some(url) = lookup("PUBLIC_URL") {
            self.public_url = url;
        }
        if let Some(timeout) = lookup("HTTP_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.http_timeout_ms = timeout;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("sumup_base_url", &self.sumup_base_url),
            ("public_url", &self.public_url),
        ] {
            let valid = Url::parse(value)
                .map(|url| !url.cannot_be_a_base())
                .unwrap_or(false);
            if !valid {
                return Err(ConfigError::InvalidUrl {
                    name,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}
