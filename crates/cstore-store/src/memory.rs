//! In-memory store implementations.
//!
//! Back the collaborator traits with plain maps for tests and local/dev
//! mode. The content and key stores carry a failure switch so orchestration
//! tests can force a write to fail partway through an upload.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use cstore_core::types::{FileMetadata, StorageUsage, TypeUsage};
use cstore_core::{StoreError, StoreResult};

use crate::traits::{ContentStore, KeyRecord, KeyStore, MetadataStore};

/// Metadata rows keyed by (file_id, user_id). Soft-deleted rows stay in the
/// map with the flag set, mirroring how the real schema retains them.
#[derive(Default)]
pub struct MemoryMetadataStore {
    rows: RwLock<HashMap<(String, String), FileMetadata>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows including soft-deleted ones. Test helper.
    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn upsert_file(&self, row: FileMetadata) -> StoreResult<()> {
        let key = (row.file_id.clone(), row.user_id.clone());
        self.rows.write().await.insert(key, row);
        Ok(())
    }

    async fn query_by_id(
        &self,
        file_id: &str,
        user_id: &str,
    ) -> StoreResult<Option<FileMetadata>> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&(file_id.to_string(), user_id.to_string()))
            .filter(|row| !row.is_deleted)
            .cloned())
    }

    async fn soft_delete(&self, file_id: &str, user_id: &str) -> StoreResult<bool> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&(file_id.to_string(), user_id.to_string())) {
            Some(row) if !row.is_deleted => {
                row.is_deleted = true;
                row.last_modified_at = chrono::Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_file(&self, file_id: &str, user_id: &str) -> StoreResult<()> {
        self.rows
            .write()
            .await
            .remove(&(file_id.to_string(), user_id.to_string()));
        Ok(())
    }

    async fn query_by_folder(
        &self,
        user_id: &str,
        folder_id: &str,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<FileMetadata>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<FileMetadata> = rows
            .values()
            .filter(|row| {
                !row.is_deleted && row.user_id == user_id && row.parent_folder_id == folder_id
            })
            .cloned()
            .collect();
        // Newest first, file id as a stable tiebreak
        matched.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| a.file_id.cmp(&b.file_id))
        });
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_by_folder(&self, user_id: &str, folder_id: &str) -> StoreResult<u64> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|row| {
                !row.is_deleted && row.user_id == user_id && row.parent_folder_id == folder_id
            })
            .count() as u64)
    }

    async fn usage_by_user(&self, user_id: &str) -> StoreResult<StorageUsage> {
        let rows = self.rows.read().await;
        let mut usage = StorageUsage::default();
        for row in rows.values() {
            if row.is_deleted || row.user_id != user_id {
                continue;
            }
            usage.total_files += 1;
            usage.total_size += row.size_bytes;
            let entry = usage.by_type.entry(row.file_type).or_insert(TypeUsage {
                files: 0,
                bytes: 0,
            });
            entry.files += 1;
            entry.bytes += row.size_bytes;
        }
        Ok(usage)
    }
}

/// Ciphertext blobs keyed by file id.
#[derive(Default)]
pub struct MemoryContentStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    fail_puts: AtomicBool,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail with a storage error. Test hook.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub async fn blob_count(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, file_id: &str, bytes: Vec<u8>) -> StoreResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Storage(format!(
                "content put failed for file {file_id} (injected)"
            )));
        }
        self.blobs.write().await.insert(file_id.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, file_id: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(file_id).cloned())
    }

    async fn delete(&self, file_id: &str) -> StoreResult<()> {
        self.blobs.write().await.remove(file_id);
        Ok(())
    }
}

/// Wrapped key records keyed by (file_id, user_id).
#[derive(Default)]
pub struct MemoryKeyStore {
    records: RwLock<HashMap<(String, String), KeyRecord>>,
    fail_upserts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `upsert` fail with a storage error. Test hook.
    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `delete` fail with a storage error. Test hook.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn upsert(&self, record: KeyRecord) -> StoreResult<()> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(StoreError::Storage(format!(
                "key upsert failed for file {} (injected)",
                record.file_id
            )));
        }
        let key = (record.file_id.clone(), record.user_id.clone());
        self.records.write().await.insert(key, record);
        Ok(())
    }

    async fn get(&self, file_id: &str, user_id: &str) -> StoreResult<Option<KeyRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&(file_id.to_string(), user_id.to_string()))
            .cloned())
    }

    async fn delete(&self, file_id: &str, user_id: &str) -> StoreResult<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Storage(format!(
                "key delete failed for file {file_id} (injected)"
            )));
        }
        Ok(self
            .records
            .write()
            .await
            .remove(&(file_id.to_string(), user_id.to_string()))
            .is_some())
    }
}
