//! FileService: the facade callers hold.
//!
//! Owns the page cache and consults it before the metadata store on the
//! listing path; the delete path invalidates the affected folder's pages.

use std::sync::Arc;

use tracing::{debug, info};

use cstore_core::config::StoreConfig;
use cstore_core::types::{
    DownloadedFile, FileDescriptor, FileListing, FileMetadata, Pagination, StorageUsage,
};
use cstore_core::StoreResult;
use cstore_crypto::load_master_key;
use cstore_cache::FileCache;
use cstore_store::{Compressor, ContentBackends, KeyStore, MetadataStore, ZstdCompressor};

use crate::download::Downloader;
use crate::keymanager::KeyManager;
use crate::upload::{UploadRequest, Uploader};

pub struct FileService {
    metadata: Arc<dyn MetadataStore>,
    cache: Arc<FileCache>,
    uploader: Uploader,
    downloader: Downloader,
    keys: Arc<KeyManager>,
    default_page_size: usize,
}

impl FileService {
    /// Build the service. Fails with `Config` when no master key is
    /// available (see `cstore_crypto::load_master_key`).
    pub fn new(
        config: &StoreConfig,
        metadata: Arc<dyn MetadataStore>,
        backends: ContentBackends,
        key_store: Arc<dyn KeyStore>,
    ) -> StoreResult<Self> {
        let master = load_master_key(&config.crypto)?;
        let keys = Arc::new(KeyManager::new(master, key_store));
        let compressor: Option<Arc<dyn Compressor>> = config
            .compression
            .enabled
            .then(|| Arc::new(ZstdCompressor::new(config.compression.level)) as Arc<dyn Compressor>);

        let uploader = Uploader::new(
            Arc::clone(&metadata),
            backends.clone(),
            Arc::clone(&keys),
            compressor,
            config.compression.clone(),
        );
        let downloader = Downloader::new(
            Arc::clone(&metadata),
            backends,
            Arc::clone(&keys),
        );

        Ok(Self {
            metadata,
            cache: Arc::new(FileCache::new(&config.cache)),
            uploader,
            downloader,
            keys,
            default_page_size: config.cache.page_size,
        })
    }

    /// Start the cache's background TTL sweep. Requires a tokio runtime.
    pub fn start_sweeper(&self) {
        self.cache.start_sweeper();
    }

    /// Stop the background sweep. Part of orderly shutdown.
    pub fn shutdown(&self) {
        self.cache.shutdown();
    }

    pub fn cache(&self) -> &Arc<FileCache> {
        &self.cache
    }

    pub fn key_manager(&self) -> &Arc<KeyManager> {
        &self.keys
    }

    pub async fn upload(&self, request: UploadRequest) -> StoreResult<FileDescriptor> {
        self.uploader.upload(request).await
    }

    pub async fn download(&self, file_id: &str, user_id: &str) -> StoreResult<DownloadedFile> {
        self.downloader.download(file_id, user_id).await
    }

    /// Soft-delete a file. `Ok(false)` means no live file matched; failures
    /// are errors, never folded into the bool.
    pub async fn delete(&self, file_id: &str, user_id: &str) -> StoreResult<bool> {
        let Some(row) = self.metadata.query_by_id(file_id, user_id).await? else {
            debug!(file_id, user_id, "delete: no live file");
            return Ok(false);
        };

        let deleted = self.metadata.soft_delete(file_id, user_id).await?;
        if !deleted {
            return Ok(false);
        }

        // The row is flagged; cached pages for the folder are stale now no
        // matter what happens to the key record, so drop them first
        self.cache
            .invalidate_folder_cache(user_id, &row.parent_folder_id);
        self.keys.delete_key(file_id, user_id).await?;

        info!(file_id, user_id, folder = %row.parent_folder_id, "file deleted");
        Ok(true)
    }

    /// One page of a folder listing, cache-first.
    pub async fn list_page(
        &self,
        user_id: &str,
        folder_id: &str,
        page: usize,
        page_size: usize,
    ) -> StoreResult<FileListing> {
        let page_size = if page_size == 0 {
            self.default_page_size
        } else {
            page_size
        };

        if let Some(rows) = self.cache.get_cached_files_page(user_id, folder_id, page) {
            debug!(user_id, folder_id, page, "listing served from cache");
            return self
                .envelope(user_id, folder_id, page, page_size, rows, true)
                .await;
        }

        let rows = self
            .metadata
            .query_by_folder(user_id, folder_id, page_size, page.saturating_mul(page_size))
            .await?;
        self.cache
            .cache_files_page(user_id, folder_id, page, rows.clone());

        self.envelope(user_id, folder_id, page, page_size, rows, false)
            .await
    }

    pub async fn storage_usage(&self, user_id: &str) -> StoreResult<StorageUsage> {
        self.metadata.usage_by_user(user_id).await
    }

    async fn envelope(
        &self,
        user_id: &str,
        folder_id: &str,
        page: usize,
        page_size: usize,
        rows: Vec<FileMetadata>,
        from_cache: bool,
    ) -> StoreResult<FileListing> {
        let total = self.metadata.count_by_folder(user_id, folder_id).await?;
        // Consumed rows counted in u64 so oversized page values saturate
        // instead of overflowing
        let consumed = (page as u64).saturating_add(1).saturating_mul(page_size as u64);
        let has_more = consumed < total;
        Ok(FileListing {
            rows,
            pagination: Pagination {
                page,
                page_size,
                total,
                has_more,
                from_cache,
            },
        })
    }
}
