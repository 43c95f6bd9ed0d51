//! Client configuration loaded from `bsubio.toml`.
//!
//! [`BsubConfig`] holds every tunable the client reads. Fields missing from
//! the file fall back to defaults; `BSUBIO_API_KEY` and `BSUBIO_BASE_URL`
//! take precedence over the file.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::api::DEFAULT_BASE_URL;

pub const CONFIG_FILE: &str = "bsubio.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BsubConfig {
    /// API key sent as a bearer credential.
    #[serde(default)]
    pub api_key: String,

    /// Service root, without the `/v1` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Delay between status fetches while waiting for a job.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Upper bound on a single request, including upload and download.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for BsubConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BsubConfig {
    /// Loads `bsubio.toml` from the current directory, or defaults if absent.
    pub fn load() -> Result<Self> {
        let path = Path::new(CONFIG_FILE);
        let config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    /// Loads the given file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(Self::from_file(path)?.with_env_overrides())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str::<BsubConfig>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("BSUBIO_API_KEY").ok(),
            std::env::var("BSUBIO_BASE_URL").ok(),
        )
    }

    /// Replaces key and URL with the given values, ignoring empty ones.
    fn with_overrides(mut self, api_key: Option<String>, base_url: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.api_key = key;
        }
        if let Some(url) = base_url.filter(|u| !u.is_empty()) {
            self.base_url = url;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
