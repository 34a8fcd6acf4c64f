//! Per-user page cache for paginated file listings.
//!
//! Topology: a lock-free concurrent map of user id → cache entry, where each
//! entry guards its page map with its own read-write lock. Cross-user
//! operations never contend; within a user, many readers or one writer.
//!
//! Entries are created lazily on first write and die one of three ways:
//! explicit per-user invalidation, per-folder invalidation (which only strips
//! that folder's page keys), or the periodic TTL sweep once the entry has
//! been idle past the eviction window. The sweep removes whole entries from
//! the top-level map without taking the entry lock; an entry touched
//! concurrently with the sweep either survives one extra cycle or is
//! evicted, never left half-alive.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use cstore_core::config::CacheConfig;
use cstore_core::types::FileMetadata;

/// Cache key for one page of one folder's listing.
fn page_key(folder_id: &str, page: usize) -> String {
    format!("{folder_id}_page_{page}")
}

fn folder_prefix(folder_id: &str) -> String {
    format!("{folder_id}_page_")
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

struct PageState {
    loaded_pages: HashSet<String>,
    pages: HashMap<String, Vec<FileMetadata>>,
    total_file_count: u64,
}

struct UserFileCache {
    state: RwLock<PageState>,
    /// Unix millis of the last read or write. Atomic so readers can refresh
    /// it under the read lock and the sweeper can inspect it with no lock.
    last_access: AtomicU64,
}

impl UserFileCache {
    fn new(total_file_count: u64) -> Self {
        Self {
            state: RwLock::new(PageState {
                loaded_pages: HashSet::new(),
                pages: HashMap::new(),
                total_file_count,
            }),
            last_access: AtomicU64::new(now_millis()),
        }
    }

    fn touch(&self) {
        self.last_access.store(now_millis(), Ordering::Relaxed);
    }
}

pub struct FileCache {
    users: Arc<DashMap<String, Arc<UserFileCache>>>,
    eviction_window: Duration,
    sweep_interval: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl FileCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            eviction_window: Duration::from_secs(config.eviction_minutes * 60),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
            sweeper: Mutex::new(None),
        }
    }

    /// Pre-create a user's entry with a known file count. Entries are
    /// otherwise created lazily by the first `cache_files_page`.
    pub fn init_user_cache(&self, user_id: &str, total_file_count: u64) {
        self.users
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(UserFileCache::new(total_file_count)));
    }

    fn entry(&self, user_id: &str) -> Arc<UserFileCache> {
        self.users
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(UserFileCache::new(0)))
            .clone()
    }

    /// Insert one listing page under the user's write lock.
    pub fn cache_files_page(
        &self,
        user_id: &str,
        folder_id: &str,
        page: usize,
        rows: Vec<FileMetadata>,
    ) {
        let entry = self.entry(user_id);
        let key = page_key(folder_id, page);
        {
            let mut state = entry.state.write().unwrap_or_else(|e| e.into_inner());
            state.loaded_pages.insert(key.clone());
            state.pages.insert(key, rows);
        }
        entry.touch();
    }

    /// Look up one listing page. A miss is a normal outcome; the caller
    /// falls back to the metadata store.
    pub fn get_cached_files_page(
        &self,
        user_id: &str,
        folder_id: &str,
        page: usize,
    ) -> Option<Vec<FileMetadata>> {
        let entry = self.users.get(user_id)?.value().clone();
        let key = page_key(folder_id, page);
        let rows = {
            let state = entry.state.read().unwrap_or_else(|e| e.into_inner());
            state.pages.get(&key).cloned()
        };
        entry.touch();
        rows
    }

    /// Pages in `[lo..=hi]` not yet marked loaded for this folder. An absent
    /// user entry means every page is missing.
    pub fn get_missing_pages(
        &self,
        user_id: &str,
        folder_id: &str,
        lo: usize,
        hi: usize,
    ) -> Vec<usize> {
        let Some(entry) = self.users.get(user_id).map(|e| e.value().clone()) else {
            return (lo..=hi).collect();
        };
        let state = entry.state.read().unwrap_or_else(|e| e.into_inner());
        (lo..=hi)
            .filter(|page| !state.loaded_pages.contains(&page_key(folder_id, *page)))
            .collect()
    }

    /// Drop the user's whole entry.
    pub fn invalidate_user_cache(&self, user_id: &str) {
        self.users.remove(user_id);
    }

    /// Strip only the given folder's page keys, leaving other folders'
    /// cached pages intact.
    pub fn invalidate_folder_cache(&self, user_id: &str, folder_id: &str) {
        let Some(entry) = self.users.get(user_id).map(|e| e.value().clone()) else {
            return;
        };
        let prefix = folder_prefix(folder_id);
        let mut state = entry.state.write().unwrap_or_else(|e| e.into_inner());
        state.loaded_pages.retain(|k| !k.starts_with(&prefix));
        state.pages.retain(|k, _| !k.starts_with(&prefix));
    }

    /// Remove every entry idle past the eviction window. Called by the
    /// sweeper, callable directly in tests.
    pub fn evict_idle(&self) {
        let cutoff = now_millis().saturating_sub(self.eviction_window.as_millis() as u64);
        let before = self.users.len();
        self.users
            .retain(|_, entry| entry.last_access.load(Ordering::Relaxed) >= cutoff);
        let evicted = before.saturating_sub(self.users.len());
        if evicted > 0 {
            debug!(evicted, "idle cache entries evicted");
        }
    }

    /// Number of users with a live entry.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Recorded total file count for a user, if an entry exists.
    pub fn total_file_count(&self, user_id: &str) -> Option<u64> {
        let entry = self.users.get(user_id)?.value().clone();
        let state = entry.state.read().unwrap_or_else(|e| e.into_inner());
        Some(state.total_file_count)
    }

    /// Start the periodic TTL sweep. Idempotent; the task runs until
    /// `shutdown`.
    pub fn start_sweeper(self: &Arc<Self>) {
        let mut guard = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_some() {
            return;
        }
        let cache = Arc::clone(self);
        let interval = self.sweep_interval;
        info!(interval_secs = interval.as_secs(), "cache sweeper started");
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick would sweep an empty cache
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.evict_idle();
            }
        }));
    }

    /// Stop the sweep task. Safe to call without a running sweeper.
    pub fn shutdown(&self) {
        let mut guard = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = guard.take() {
            handle.abort();
            info!("cache sweeper stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cstore_core::types::{BackendKind, FileType};

    fn config(eviction_minutes: u64) -> CacheConfig {
        CacheConfig {
            page_size: 20,
            eviction_minutes,
            sweep_interval_secs: 1,
        }
    }

    fn rows(n: usize) -> Vec<FileMetadata> {
        (0..n)
            .map(|i| FileMetadata {
                file_id: format!("f{i}"),
                user_id: "u1".into(),
                original_filename: format!("f{i}.txt"),
                size_bytes: 1,
                mime_type: Some("text/plain".into()),
                file_type: FileType::Document,
                backend: Some(BackendKind::Document),
                parent_folder_id: "root".into(),
                compression: None,
                uploaded_at: Utc::now(),
                last_modified_at: Utc::now(),
                is_deleted: false,
            })
            .collect()
    }

    fn ids(rows: &[FileMetadata]) -> Vec<String> {
        rows.iter().map(|r| r.file_id.clone()).collect()
    }

    #[test]
    fn cache_and_get_roundtrip() {
        let cache = FileCache::new(&config(60));
        assert!(cache.get_cached_files_page("u1", "root", 0).is_none());

        let page = rows(3);
        cache.cache_files_page("u1", "root", 0, page.clone());
        let cached = cache.get_cached_files_page("u1", "root", 0).unwrap();
        assert_eq!(ids(&cached), ids(&page));

        // Other pages and folders still miss
        assert!(cache.get_cached_files_page("u1", "root", 1).is_none());
        assert!(cache.get_cached_files_page("u1", "other", 0).is_none());
        assert!(cache.get_cached_files_page("u2", "root", 0).is_none());
    }

    #[test]
    fn missing_pages_full_range_when_absent() {
        let cache = FileCache::new(&config(60));
        assert_eq!(cache.get_missing_pages("u1", "f", 0, 4), vec![0, 1, 2, 3, 4]);

        cache.cache_files_page("u1", "f", 2, rows(1));
        assert_eq!(cache.get_missing_pages("u1", "f", 0, 4), vec![0, 1, 3, 4]);
    }

    #[test]
    fn missing_pages_scoped_to_folder() {
        let cache = FileCache::new(&config(60));
        cache.cache_files_page("u1", "a", 0, rows(1));
        // Folder b has nothing loaded even though the user entry exists
        assert_eq!(cache.get_missing_pages("u1", "b", 0, 1), vec![0, 1]);
    }

    #[test]
    fn invalidate_user_drops_everything() {
        let cache = FileCache::new(&config(60));
        cache.cache_files_page("u1", "a", 0, rows(1));
        cache.cache_files_page("u1", "b", 0, rows(1));
        assert_eq!(cache.user_count(), 1);

        cache.invalidate_user_cache("u1");
        assert_eq!(cache.user_count(), 0);
        assert!(cache.get_cached_files_page("u1", "a", 0).is_none());
    }

    #[test]
    fn invalidate_folder_leaves_other_folders() {
        let cache = FileCache::new(&config(60));
        cache.cache_files_page("u1", "docs", 0, rows(2));
        cache.cache_files_page("u1", "docs", 1, rows(2));
        cache.cache_files_page("u1", "pics", 0, rows(2));

        cache.invalidate_folder_cache("u1", "docs");

        assert!(cache.get_cached_files_page("u1", "docs", 0).is_none());
        assert!(cache.get_cached_files_page("u1", "docs", 1).is_none());
        assert!(cache.get_cached_files_page("u1", "pics", 0).is_some());
        assert_eq!(cache.get_missing_pages("u1", "docs", 0, 1), vec![0, 1]);
        assert!(cache.get_missing_pages("u1", "pics", 0, 0).is_empty());
    }

    #[test]
    fn folder_prefix_does_not_bleed() {
        // "doc" must not strip "docs" pages
        let cache = FileCache::new(&config(60));
        cache.cache_files_page("u1", "docs", 0, rows(1));
        cache.invalidate_folder_cache("u1", "doc");
        assert!(cache.get_cached_files_page("u1", "docs", 0).is_some());
    }

    #[test]
    fn init_user_cache_records_total() {
        let cache = FileCache::new(&config(60));
        cache.init_user_cache("u1", 42);
        assert_eq!(cache.total_file_count("u1"), Some(42));
        // Re-init does not clobber an existing entry
        cache.init_user_cache("u1", 7);
        assert_eq!(cache.total_file_count("u1"), Some(42));
    }

    #[test]
    fn evict_idle_removes_expired_entries() {
        // Zero-minute window: everything is immediately past the cutoff
        let cache = FileCache::new(&config(0));
        cache.cache_files_page("u1", "a", 0, rows(1));
        std::thread::sleep(Duration::from_millis(5));
        cache.evict_idle();
        assert_eq!(cache.user_count(), 0);
    }

    #[test]
    fn evict_idle_keeps_active_entries() {
        let cache = FileCache::new(&config(60));
        cache.cache_files_page("u1", "a", 0, rows(1));
        cache.evict_idle();
        assert_eq!(cache.user_count(), 1);
    }

    #[test]
    fn read_refreshes_last_access() {
        let cache = FileCache::new(&config(60));
        cache.cache_files_page("u1", "a", 0, rows(1));
        let entry = cache.users.get("u1").unwrap().value().clone();
        let before = entry.last_access.load(Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(5));
        cache.get_cached_files_page("u1", "a", 0);
        let after = entry.last_access.load(Ordering::Relaxed);
        assert!(after > before);
    }

    #[test]
    fn concurrent_readers_and_writers_do_not_tear() {
        let cache = Arc::new(FileCache::new(&config(60)));
        let mut handles = Vec::new();

        for t in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..200 {
                    if (t + i) % 2 == 0 {
                        // Writers alternate between two full page values
                        let n = if i % 4 == 0 { 3 } else { 7 };
                        cache.cache_files_page("u1", "root", 0, rows(n));
                    } else if let Some(page) = cache.get_cached_files_page("u1", "root", 0) {
                        // Readers only ever see a complete write
                        assert!(page.len() == 3 || page.len() == 7, "torn page observed");
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[tokio::test]
    async fn sweeper_runs_and_shuts_down() {
        // Shrink the window and interval well below test timescales
        let cache = Arc::new(FileCache {
            users: Arc::new(DashMap::new()),
            eviction_window: Duration::from_millis(0),
            sweep_interval: Duration::from_millis(20),
            sweeper: Mutex::new(None),
        });

        cache.cache_files_page("u1", "a", 0, rows(1));
        cache.start_sweeper();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.user_count(), 0, "sweeper should have evicted u1");

        cache.shutdown();
        // Second shutdown is a no-op
        cache.shutdown();
    }
}
