//! Application configuration
//!
//! Loaded with the `config` crate from built-in defaults, an optional TOML
//! file, and `TTSPROJ__`-prefixed environment variables (in increasing
//! precedence), e.g. `TTSPROJ__FETCH__DELAY_MS=250`.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::domain::value_objects::ProjectLayout;

/// Default configuration file name, looked up in the working directory
const DEFAULT_CONFIG_NAME: &str = "ttsproj";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub layout: ProjectLayout,
}

/// Settings for backing up referenced assets
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Pause before every download, in milliseconds
    pub delay_ms: u64,
    /// Write buffer size for streamed downloads
    pub chunk_size: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            delay_ms: 100,
            chunk_size: 8192,
            user_agent: concat!("ttsproj/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl AppConfig {
    /// Load configuration, reading `path` if given (it must then exist) or
    /// `ttsproj.toml` from the working directory if present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("TTSPROJ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}
