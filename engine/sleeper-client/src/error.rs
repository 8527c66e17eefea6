//! Error types for the Sleeper client

use thiserror::Error;

/// Result type alias for Sleeper API calls
pub type Result<T> = std::result::Result<T, SleeperError>;

#[derive(Error, Debug)]
pub enum SleeperError {
    #[error("HTTP error calling {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Sleeper API returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Sleeper API error: {message}")]
    Api { message: String },
}

impl SleeperError {
    /// Create a new API error
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api { message: message.into() }
    }
}
