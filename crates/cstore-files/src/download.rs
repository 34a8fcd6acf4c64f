//! Download orchestration.
//!
//! Metadata-routed: the stored backend name decides where the ciphertext
//! lives; rows written before backends were recorded fall back to
//! recomputing the route from the MIME type.

use std::sync::Arc;

use tracing::{debug, error};

use cstore_core::types::{CompressionAlg, DownloadedFile};
use cstore_core::{StoreError, StoreResult};
use cstore_crypto::decrypt_payload;
use cstore_store::{backend_for, Compressor, ContentBackends, MetadataStore, ZstdCompressor};

use crate::keymanager::KeyManager;

pub struct Downloader {
    metadata: Arc<dyn MetadataStore>,
    backends: ContentBackends,
    keys: Arc<KeyManager>,
}

impl Downloader {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        backends: ContentBackends,
        keys: Arc<KeyManager>,
    ) -> Self {
        Self {
            metadata,
            backends,
            keys,
        }
    }

    pub async fn download(&self, file_id: &str, user_id: &str) -> StoreResult<DownloadedFile> {
        let row = self
            .metadata
            .query_by_id(file_id, user_id)
            .await
            .map_err(|e| {
                StoreError::Storage(format!("querying metadata for file {file_id}: {e}"))
            })?
            .ok_or_else(|| StoreError::NotFound {
                file_id: file_id.to_string(),
            })?;

        // Legacy rows predate backend recording
        let backend_kind = row
            .backend
            .unwrap_or_else(|| backend_for(row.mime_type.as_deref()));
        let backend = self.backends.get(backend_kind)?;

        let ciphertext = backend
            .get(file_id)
            .await
            .map_err(|e| {
                StoreError::Storage(format!(
                    "fetching content for file {file_id} from {backend_kind}: {e}"
                ))
            })?
            .ok_or_else(|| {
                // Metadata says the blob exists; this is a consistency
                // violation and is always reported as such
                error!(file_id, backend = %backend_kind, "metadata present but blob missing");
                StoreError::ContentMissing {
                    file_id: file_id.to_string(),
                    backend: backend_kind.name().to_string(),
                }
            })?;

        let key = self
            .keys
            .retrieve_key(file_id, user_id)
            .await?
            .ok_or_else(|| {
                StoreError::Crypto(format!("key not found for file {file_id}"))
            })?;

        let payload = decrypt_payload(&key, &ciphertext)?;

        let content = match row.compression {
            Some(CompressionAlg::Zstd) => {
                ZstdCompressor::default().decompress(&payload, CompressionAlg::Zstd)?
            }
            None => payload,
        };

        debug!(file_id, size = content.len(), "file downloaded");

        Ok(DownloadedFile {
            content,
            filename: row.original_filename,
            mime_type: row.mime_type,
        })
    }
}
