//! Persistence backend trait and implementations

use crate::config::PersistenceConfig;
use crate::error::{PersistenceError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Abstract trait for persistence backends
///
/// A backend stores opaque named structures. Writes replace the whole
/// structure; there are no partial updates.
#[async_trait::async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Initialize the persistence backend
    async fn initialize(&mut self) -> Result<()>;

    /// Read a structure, `None` if it has never been written
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Replace a structure
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Get the configuration
    fn config(&self) -> &PersistenceConfig;
}

/// Local file-based persistence backend
pub struct LocalPersistence {
    config: PersistenceConfig,
    initialized: bool,
}

impl LocalPersistence {
    /// Create a new local persistence backend
    pub fn new(config: PersistenceConfig) -> Result<Self> {
        config.validate().map_err(PersistenceError::config)?;

        Ok(Self { config, initialized: false })
    }

    /// Create a new local persistence backend with default config
    pub fn with_default_config(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let config = PersistenceConfig::new(data_dir);
        Self::new(config)
    }

    /// Get the data directory
    pub fn data_dir(&self) -> &PathBuf {
        &self.config.data_dir
    }

    fn ensure_initialized(&self) -> Result<()> {
        if !self.initialized {
            return Err(PersistenceError::NotInitialized { data_dir: self.config.data_dir.clone() });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for LocalPersistence {
    async fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.config.data_dir).await?;

        self.initialized = true;

        tracing::info!(data_dir = ?self.config.data_dir, "local persistence initialized");

        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.ensure_initialized()?;

        let path = self.config.structure_path(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.ensure_initialized()?;

        let path = self.config.structure_path(name);
        let tmp_path = path.with_extension("json.tmp");

        // Readers only ever see a complete file: write aside, then swap in.
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        tracing::debug!(structure = name, bytes = bytes.len(), "structure written");

        Ok(())
    }

    fn config(&self) -> &PersistenceConfig {
        &self.config
    }
}

/// In-memory persistence backend (for testing)
pub struct InMemoryPersistence {
    config: PersistenceConfig,
    structures: Arc<tokio::sync::Mutex<HashMap<String, Vec<u8>>>>,
    writes: Arc<tokio::sync::Mutex<HashMap<String, usize>>>,
}

impl InMemoryPersistence {
    /// Create a new in-memory persistence backend
    pub fn new(config: PersistenceConfig) -> Self {
        Self {
            config,
            structures: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            writes: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
        }
    }

    /// Create a new in-memory persistence backend with default config
    pub fn with_default_config() -> Self {
        Self::new(PersistenceConfig::default())
    }

    /// Number of times `name` has been written
    pub async fn write_count(&self, name: &str) -> usize {
        self.writes.lock().await.get(name).copied().unwrap_or(0)
    }

    /// Store raw bytes directly, bypassing the write counter
    pub async fn seed(&self, name: &str, bytes: impl Into<Vec<u8>>) {
        self.structures.lock().await.insert(name.to_string(), bytes.into());
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for InMemoryPersistence {
    async fn initialize(&mut self) -> Result<()> {
        tracing::info!("In-memory persistence backend initialized");
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.structures.lock().await.get(name).cloned())
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.structures.lock().await.insert(name.to_string(), bytes.to_vec());
        *self.writes.lock().await.entry(name.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn config(&self) -> &PersistenceConfig {
        &self.config
    }
}
