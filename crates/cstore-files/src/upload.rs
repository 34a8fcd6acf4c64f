//! Upload orchestration.
//!
//! Step order matters: metadata first, then ciphertext, then the wrapped
//! key. If a later step fails the metadata row is removed again so no row
//! ever references content or keys that were never stored.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use cstore_core::config::CompressionConfig;
use cstore_core::types::{BackendKind, FileDescriptor, FileMetadata};
use cstore_core::{StoreError, StoreResult};
use cstore_crypto::{encrypt_payload, generate_content_key};
use cstore_store::{
    backend_for, file_type_for, should_compress, Compressor, ContentBackends, MetadataStore,
};

use crate::keymanager::KeyManager;

pub struct UploadRequest {
    pub user_id: String,
    pub bytes: Vec<u8>,
    pub original_filename: String,
    pub mime_type: Option<String>,
    pub parent_folder_id: String,
}

pub struct Uploader {
    metadata: Arc<dyn MetadataStore>,
    backends: ContentBackends,
    keys: Arc<KeyManager>,
    compressor: Option<Arc<dyn Compressor>>,
    compression: CompressionConfig,
}

impl Uploader {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        backends: ContentBackends,
        keys: Arc<KeyManager>,
        compressor: Option<Arc<dyn Compressor>>,
        compression: CompressionConfig,
    ) -> Self {
        Self {
            metadata,
            backends,
            keys,
            compressor,
            compression,
        }
    }

    pub async fn upload(&self, request: UploadRequest) -> StoreResult<FileDescriptor> {
        if request.bytes.is_empty() {
            return Err(StoreError::InvalidInput("empty file payload".into()));
        }
        if request.user_id.trim().is_empty() {
            return Err(StoreError::InvalidInput("blank user id".into()));
        }
        if request.original_filename.trim().is_empty() {
            return Err(StoreError::InvalidInput("blank filename".into()));
        }

        let file_id = Uuid::new_v4().to_string();
        let size_bytes = request.bytes.len() as u64;
        let mime = request.mime_type.as_deref();
        let file_type = file_type_for(mime);
        let backend_kind = backend_for(mime);
        let uploaded_at = Utc::now();

        // Compress before encrypting; ciphertext does not compress
        let (payload, compression) = match &self.compressor {
            Some(compressor)
                if should_compress(&self.compression, size_bytes, mime) =>
            {
                (compressor.compress(&request.bytes)?, Some(compressor.algorithm()))
            }
            _ => (request.bytes, None),
        };

        let content_key = generate_content_key();
        let ciphertext = encrypt_payload(&content_key, &payload)?;

        let row = FileMetadata {
            file_id: file_id.clone(),
            user_id: request.user_id.clone(),
            original_filename: request.original_filename.clone(),
            size_bytes,
            mime_type: request.mime_type.clone(),
            file_type,
            backend: Some(backend_kind),
            parent_folder_id: request.parent_folder_id.clone(),
            compression,
            uploaded_at,
            last_modified_at: uploaded_at,
            is_deleted: false,
        };
        self.metadata.upsert_file(row).await.map_err(|e| {
            StoreError::Storage(format!("persisting metadata for file {file_id}: {e}"))
        })?;

        let backend = self.backends.get(backend_kind)?;
        if let Err(e) = backend.put(&file_id, ciphertext).await {
            self.compensate(&file_id, &request.user_id, backend_kind, false)
                .await;
            return Err(StoreError::Storage(format!(
                "writing content for file {file_id} to {backend_kind}: {e}"
            )));
        }

        if let Err(e) = self
            .keys
            .store_key(&file_id, &request.user_id, &content_key)
            .await
        {
            self.compensate(&file_id, &request.user_id, backend_kind, true)
                .await;
            return Err(e);
        }

        info!(
            file_id,
            user_id = %request.user_id,
            backend = %backend_kind,
            size_bytes,
            compressed = compression.is_some(),
            "file uploaded"
        );

        Ok(FileDescriptor {
            file_id,
            filename: request.original_filename,
            size: size_bytes,
            mime_type: request.mime_type,
            file_type,
            backend: backend_kind,
            uploaded_at,
        })
    }

    /// Take back what an aborted upload already wrote. The metadata removal
    /// is the required part; orphaned ciphertext is merely wasted space, so
    /// its removal is best-effort.
    async fn compensate(
        &self,
        file_id: &str,
        user_id: &str,
        backend_kind: BackendKind,
        blob_written: bool,
    ) {
        if blob_written {
            if let Ok(backend) = self.backends.get(backend_kind) {
                if let Err(e) = backend.delete(file_id).await {
                    warn!(file_id, "compensation: orphaned blob removal failed: {e}");
                }
            }
        }
        if let Err(e) = self.metadata.remove_file(file_id, user_id).await {
            warn!(
                file_id,
                "compensation: metadata removal failed, row may dangle: {e}"
            );
        } else {
            info!(file_id, "upload compensated, metadata row removed");
        }
    }
}
