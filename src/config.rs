//! Timing configuration, optionally loaded from a TOML file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable intervals for the synchronization loops.
///
/// Defaults preserve the magnitudes the protocol was tuned with: geometry
/// sampling every few milliseconds so motion reads as continuous, a ~100 ms
/// debounce on inbound changes, and a ~500 ms liveness sweep deadline. The
/// sweep deadline has no derived lower bound; it only needs to exceed one
/// full round trip of the broadcast transport under normal load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Geometry sampling period in milliseconds.
    pub update_interval_ms: u64,
    /// Quiet window for coalescing external change notifications.
    pub debounce_ms: u64,
    /// Delay between the liveness ping and the eviction sweep.
    pub sweep_delay_ms: u64,
    /// Poll period for detecting external writes in file-backed stores.
    pub store_poll_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 5,
            debounce_ms: 100,
            sweep_delay_ms: 500,
            store_poll_ms: 50,
        }
    }
}

impl SyncConfig {
    /// Load config from a TOML file path. Returns None if the file doesn't
    /// exist.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::ReadFailed(path.to_path_buf(), err))?;
        let config = toml::from_str(&contents)
            .map_err(|err| ConfigError::ParseFailed(path.to_path_buf(), err))?;
        Ok(Some(config))
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn sweep_delay(&self) -> Duration {
        Duration::from_millis(self.sweep_delay_ms)
    }

    pub fn store_poll(&self) -> Duration {
        Duration::from_millis(self.store_poll_ms)
    }
}

/// Errors that can occur when loading config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    ReadFailed(std::path::PathBuf, #[source] std::io::Error),

    #[error("failed to parse config {0}: {1}")]
    ParseFailed(std::path::PathBuf, #[source] toml::de::Error),
}
