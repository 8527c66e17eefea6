//! Typed cache envelope and progress marker

use crate::backend::PersistenceBackend;
use crate::error::{PersistenceError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Last (season, week) that was fully built and persisted.
///
/// `(0, 0)` means nothing has been built yet.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProgressMarker {
    pub season: i32,
    pub week: u32,
}

impl ProgressMarker {
    pub fn new(season: i32, week: u32) -> Self {
        Self { season, week }
    }

    pub fn is_initial(&self) -> bool {
        self.season == 0 && self.week == 0
    }
}

impl std::fmt::Display for ProgressMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} week {}", self.season, self.week)
    }
}

/// A cache as it is stored: data plus its progress marker, kept beside the
/// season map rather than inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedCache<T> {
    #[serde(default)]
    pub progress: ProgressMarker,
    pub data: T,
}

impl<T> PersistedCache<T> {
    pub fn new(progress: ProgressMarker, data: T) -> Self {
        Self { progress, data }
    }

    /// Move the progress marker
    pub fn advance(&mut self, season: i32, week: u32) {
        self.progress = ProgressMarker::new(season, week);
    }

    /// Drop the marker and keep the data
    pub fn into_data(self) -> T {
        self.data
    }
}

/// Load a cache, `None` when it has never been written
pub async fn load_existing_cache<T: DeserializeOwned>(
    backend: &dyn PersistenceBackend,
    name: &str,
) -> Result<Option<PersistedCache<T>>> {
    let Some(bytes) = backend.read(name).await? else {
        return Ok(None);
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| PersistenceError::corruption(name, e))
}

/// Load a cache, initializing an empty one with a `(0, 0)` marker on first use
pub async fn load_cache<T: DeserializeOwned + Default>(
    backend: &dyn PersistenceBackend,
    name: &str,
) -> Result<PersistedCache<T>> {
    Ok(load_existing_cache(backend, name).await?.unwrap_or_default())
}

/// Rewrite a cache in full
pub async fn save_cache<T: Serialize + Sync>(
    backend: &dyn PersistenceBackend,
    name: &str,
    cache: &PersistedCache<T>,
) -> Result<()> {
    let bytes = if backend.config().pretty {
        serde_json::to_vec_pretty(cache)?
    } else {
        serde_json::to_vec(cache)?
    };

    backend.write(name, &bytes).await
}
