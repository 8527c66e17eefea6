//! Persistence errors

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PersistenceError>;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored structure exists but does not decode
    #[error("Structure {name} is corrupt: {reason}")]
    Corruption { name: String, reason: String },

    /// Read or write before `initialize`
    #[error("Persistence backend for {} is not initialized", data_dir.display())]
    NotInitialized { data_dir: PathBuf },
}

impl PersistenceError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn corruption(name: &str, reason: impl ToString) -> Self {
        Self::Corruption { name: name.to_string(), reason: reason.to_string() }
    }
}
