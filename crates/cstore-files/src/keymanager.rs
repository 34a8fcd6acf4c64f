//! Envelope key lifecycle over the key store.
//!
//! Content keys are wrapped under the process master key before they touch
//! persistence; raw key bytes never leave this module unencrypted.

use std::sync::Arc;

use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::debug;

use cstore_core::{StoreError, StoreResult};
use cstore_crypto::{unwrap_key, wrap_key, FileKey, MasterKey};
use cstore_store::{KeyRecord, KeyStore};

pub struct KeyManager {
    master: MasterKey,
    store: Arc<dyn KeyStore>,
}

impl KeyManager {
    pub fn new(master: MasterKey, store: Arc<dyn KeyStore>) -> Self {
        Self { master, store }
    }

    /// Wrap `raw_key` under the master key and upsert it for
    /// (file_id, user_id). Wrap failure surfaces as `Crypto`, persistence
    /// failure as `Storage`.
    pub async fn store_key(
        &self,
        file_id: &str,
        user_id: &str,
        raw_key: &FileKey,
    ) -> StoreResult<()> {
        let wrapped = wrap_key(&self.master, raw_key)?;
        let record = KeyRecord {
            file_id: file_id.to_string(),
            user_id: user_id.to_string(),
            wrapped_key: wrapped,
            file_id_hash: hash_file_id(file_id),
        };
        self.store.upsert(record).await.map_err(|e| {
            StoreError::Storage(format!("storing wrapped key for file {file_id}: {e}"))
        })?;
        debug!(file_id, "wrapped key stored");
        Ok(())
    }

    /// Look up and unwrap the content key. An absent record is `Ok(None)`,
    /// a valid outcome distinct from an unwrap failure.
    pub async fn retrieve_key(
        &self,
        file_id: &str,
        user_id: &str,
    ) -> StoreResult<Option<FileKey>> {
        let record = self.store.get(file_id, user_id).await.map_err(|e| {
            StoreError::Storage(format!("fetching wrapped key for file {file_id}: {e}"))
        })?;
        match record {
            None => Ok(None),
            Some(record) => unwrap_key(&self.master, &record.wrapped_key).map(Some),
        }
    }

    /// Returns false when no record existed.
    pub async fn delete_key(&self, file_id: &str, user_id: &str) -> StoreResult<bool> {
        self.store.delete(file_id, user_id).await.map_err(|e| {
            StoreError::Storage(format!("deleting wrapped key for file {file_id}: {e}"))
        })
    }

    pub async fn key_exists(&self, file_id: &str, user_id: &str) -> StoreResult<bool> {
        Ok(self
            .store
            .get(file_id, user_id)
            .await
            .map_err(|e| {
                StoreError::Storage(format!("probing wrapped key for file {file_id}: {e}"))
            })?
            .is_some())
    }
}

/// Base64 SHA-256 of the file id, persisted next to the wrapped key for
/// schema compatibility with the legacy key table. Never used for lookup.
fn hash_file_id(file_id: &str) -> String {
    let digest = Sha256::digest(file_id.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(digest)
}
