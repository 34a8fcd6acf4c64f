//! Store traits consumed by the upload/download/listing paths.
//!
//! Timeouts and retries belong to the implementations; callers treat every
//! method as a single fallible operation.

use async_trait::async_trait;

use cstore_core::types::{FileMetadata, StorageUsage};
use cstore_core::StoreResult;

/// Metadata rows, owned exclusively by this store. Rows are soft-deleted:
/// `soft_delete` flips the flag, `remove_file` exists only so the uploader
/// can take back a row it just wrote when a later step fails.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn upsert_file(&self, row: FileMetadata) -> StoreResult<()>;

    /// Fetch the live (non-deleted) row for (file_id, user_id).
    async fn query_by_id(&self, file_id: &str, user_id: &str)
        -> StoreResult<Option<FileMetadata>>;

    /// Flag the row deleted. Returns false when no live row matched.
    async fn soft_delete(&self, file_id: &str, user_id: &str) -> StoreResult<bool>;

    /// Hard-remove a row. Upload compensation only.
    async fn remove_file(&self, file_id: &str, user_id: &str) -> StoreResult<()>;

    /// Live rows in a folder, newest first.
    async fn query_by_folder(
        &self,
        user_id: &str,
        folder_id: &str,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<FileMetadata>>;

    async fn count_by_folder(&self, user_id: &str, folder_id: &str) -> StoreResult<u64>;

    /// Aggregate size/count/per-type usage over a user's live rows.
    async fn usage_by_user(&self, user_id: &str) -> StoreResult<StorageUsage>;
}

/// One physical content backend holding ciphertext blobs keyed by file id.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, file_id: &str, bytes: Vec<u8>) -> StoreResult<()>;

    async fn get(&self, file_id: &str) -> StoreResult<Option<Vec<u8>>>;

    async fn delete(&self, file_id: &str) -> StoreResult<()>;
}

/// A wrapped per-file content key as persisted in the key store.
///
/// `file_id_hash` is a base64 SHA-256 of the file id, carried alongside the
/// record for schema compatibility; lookups never use it.
#[derive(Debug, Clone)]
pub struct KeyRecord {
    pub file_id: String,
    pub user_id: String,
    pub wrapped_key: Vec<u8>,
    pub file_id_hash: String,
}

#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn upsert(&self, record: KeyRecord) -> StoreResult<()>;

    async fn get(&self, file_id: &str, user_id: &str) -> StoreResult<Option<KeyRecord>>;

    /// Returns false when no record existed.
    async fn delete(&self, file_id: &str, user_id: &str) -> StoreResult<bool>;
}
