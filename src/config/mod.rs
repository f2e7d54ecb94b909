//! Configuration management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::session::Namespace;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Base URL of the mobile API, e.g. `api.example.com:7440/api/v1`
    ///
    /// The realtime sockets live at the bare origin; a trailing `/api/v1`
    /// segment is stripped when resolving socket endpoints.
    pub api_base_url: String,

    /// Ceiling on one connect attempt, token fetch included
    pub connect_timeout_secs: u64,

    pub chat: NamespaceConfig,
    pub tracking: NamespaceConfig,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            connect_timeout_secs: 15,
            chat: NamespaceConfig::default(),
            tracking: NamespaceConfig::default(),
        }
    }
}

/// Per-namespace settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceConfig {
    /// Endpoint override; falls back to the shared socket base URL
    pub endpoint: Option<String>,
}

impl RealtimeConfig {
    /// Load config from file, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path, or return defaults if not found
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: RealtimeConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(RealtimeConfig::default())
        }
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ridelink")
            .join("config.toml")
    }

    /// The socket base URL: the API base with any `/api/v1` suffix stripped
    pub fn socket_base_url(&self) -> String {
        strip_api_suffix(&self.api_base_url)
    }

    /// Resolve the endpoint for a namespace, honoring per-namespace overrides
    pub fn endpoint_for(&self, namespace: Namespace) -> String {
        let override_endpoint = match namespace {
            Namespace::Chat => &self.chat.endpoint,
            Namespace::Tracking => &self.tracking.endpoint,
        };
        override_endpoint
            .clone()
            .unwrap_or_else(|| self.socket_base_url())
    }

    /// Connect timeout as a [`Duration`]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn strip_api_suffix(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    match Regex::new(r"/api/v1/?$") {
        Ok(re) => re.replace(url, "").into_owned(),
        // The pattern is a literal; an engine failure just leaves the URL as-is
        Err(_) => url.to_string(),
    }
}
