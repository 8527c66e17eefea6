//! # Persistence Layer
//!
//! Each statistics cache is persisted as one self-contained JSON structure:
//! the season → week → payload map plus a [`ProgressMarker`] naming the last
//! week that was built and written successfully. A save rewrites the whole
//! structure, so a reader sees either the previous version or the new one.
//!
//! ## Architecture
//!
//! - **PersistenceBackend**: byte-level storage of named structures
//! - **LocalPersistence**: JSON files under a data directory, written through
//!   a temporary file and an atomic rename
//! - **InMemoryPersistence**: map-backed implementation for tests
//! - **PersistedCache**: typed envelope loaded and saved through any backend
//!
//! ## Usage
//!
//! ```rust
//! use persistence::{create_local_persistence, load_cache, save_cache, PersistenceBackend};
//! use std::collections::BTreeMap;
//! use tempfile::TempDir;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let temp_dir = TempDir::new()?;
//!     let mut persistence = create_local_persistence(temp_dir.path())?;
//!     persistence.initialize().await?;
//!
//!     let mut cache = load_cache::<BTreeMap<String, f64>>(&persistence, "example").await?;
//!     cache.data.insert("total".to_string(), 12.5);
//!     cache.advance(2024, 1);
//!     save_cache(&persistence, "example", &cache).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod local;

pub use backend::{InMemoryPersistence, LocalPersistence, PersistenceBackend};
pub use cache::{load_cache, load_existing_cache, save_cache, PersistedCache, ProgressMarker};
pub use config::PersistenceConfig;
pub use error::{PersistenceError, Result};
pub use local::{create_local_persistence, create_local_persistence_with_config};
