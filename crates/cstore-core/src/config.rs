use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Top-level file store configuration (loaded from cstore.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub cache: CacheConfig,
    pub crypto: CryptoConfig,
    pub compression: CompressionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Listing page size used by callers that don't specify one
    pub page_size: usize,
    /// Idle time after which a user's cache entry is evicted (minutes)
    pub eviction_minutes: u64,
    /// Interval between background sweep runs (seconds)
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Base64-encoded 256-bit master key. Falls back to the
    /// CSTORE_MASTER_KEY environment variable when unset.
    pub master_key: Option<String>,
    /// Allow a randomly generated, non-persisted master key when none is
    /// configured. Wrapped keys become unrecoverable after restart, so this
    /// is only acceptable for local development.
    pub allow_ephemeral_master_key: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Compress payloads before encryption when within the size band
    pub enabled: bool,
    /// Smallest payload worth compressing (bytes)
    pub min_size: u64,
    /// Largest payload to attempt compressing (bytes)
    pub max_size: u64,
    /// zstd compression level
    pub level: i32,
}

impl StoreConfig {
    /// Read configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("config file not found: {} (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| StoreError::Config(format!("parsing {}: {e}", path.display())))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            eviction_minutes: 60,
            sweep_interval_secs: 1800,
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            master_key: None,
            allow_ephemeral_master_key: false,
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_size: 100 * 1024,
            max_size: 500 * 1024 * 1024,
            level: 3,
        }
    }
}
