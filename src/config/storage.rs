//! Local games table configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory holding the games database
    pub data_dir: PathBuf,
    /// Rows per insert batch during app list sync
    pub sync_batch_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".steam-fetch"),
            sync_batch_size: 1000,
        }
    }
}
