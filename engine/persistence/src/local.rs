//! Local file-based persistence implementation

use crate::backend::LocalPersistence;
use crate::config::PersistenceConfig;
use crate::error::Result;

/// Create a new local persistence instance with default configuration
pub fn create_local_persistence(
    data_dir: impl Into<std::path::PathBuf>,
) -> Result<LocalPersistence> {
    LocalPersistence::with_default_config(data_dir)
}

/// Create a new local persistence instance with custom configuration
pub fn create_local_persistence_with_config(config: PersistenceConfig) -> Result<LocalPersistence> {
    LocalPersistence::new(config)
}
