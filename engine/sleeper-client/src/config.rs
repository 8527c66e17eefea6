//! Configuration for the Sleeper client

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://api.sleeper.app/v1";

/// Sleeper API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SleeperConfig {
    pub api_base_url: String,
}

impl Default for SleeperConfig {
    fn default() -> Self {
        Self { api_base_url: DEFAULT_API_BASE_URL.to_string() }
    }
}

impl SleeperConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self { api_base_url: api_base_url.into() }
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(format!("api_base_url must be an http(s) URL, got {}", self.api_base_url));
        }
        Ok(())
    }
}
