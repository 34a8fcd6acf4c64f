//! Optional pre-encryption compression collaborator.
//!
//! Payloads are compressed before encryption (ciphertext does not compress)
//! and only when the size sits inside the configured band and the MIME type
//! is not an already-compressed format.

use cstore_core::config::CompressionConfig;
use cstore_core::types::CompressionAlg;
use cstore_core::{StoreError, StoreResult};

pub trait Compressor: Send + Sync {
    fn algorithm(&self) -> CompressionAlg;

    fn compress(&self, bytes: &[u8]) -> StoreResult<Vec<u8>>;

    fn decompress(&self, bytes: &[u8], alg: CompressionAlg) -> StoreResult<Vec<u8>>;
}

/// MIME fragments that mark a payload as already compressed.
const INCOMPRESSIBLE: &[&str] = &["zip", "rar", "gzip", "jpeg", "png", "mp4", "mp3"];

/// Decide whether a payload is worth compressing.
pub fn should_compress(
    config: &CompressionConfig,
    size_bytes: u64,
    mime_type: Option<&str>,
) -> bool {
    if !config.enabled {
        return false;
    }
    if size_bytes < config.min_size || size_bytes > config.max_size {
        return false;
    }
    if let Some(mime) = mime_type {
        let lower = mime.to_ascii_lowercase();
        if INCOMPRESSIBLE.iter().any(|frag| lower.contains(frag)) {
            return false;
        }
    }
    true
}

/// zstd-backed compressor.
pub struct ZstdCompressor {
    level: i32,
}

impl ZstdCompressor {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCompressor {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Compressor for ZstdCompressor {
    fn algorithm(&self) -> CompressionAlg {
        CompressionAlg::Zstd
    }

    fn compress(&self, bytes: &[u8]) -> StoreResult<Vec<u8>> {
        let compressed = zstd::encode_all(bytes, self.level)
            .map_err(|e| StoreError::Storage(format!("zstd compression failed: {e}")))?;
        tracing::debug!(
            original = bytes.len(),
            compressed = compressed.len(),
            "payload compressed"
        );
        Ok(compressed)
    }

    fn decompress(&self, bytes: &[u8], alg: CompressionAlg) -> StoreResult<Vec<u8>> {
        match alg {
            CompressionAlg::Zstd => zstd::decode_all(bytes)
                .map_err(|e| StoreError::Storage(format!("zstd decompression failed: {e}"))),
        }
    }
}
