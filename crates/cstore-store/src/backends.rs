//! Registry of the fixed content backends.

use std::collections::HashMap;
use std::sync::Arc;

use cstore_core::types::BackendKind;
use cstore_core::{StoreError, StoreResult};

use crate::memory::MemoryContentStore;
use crate::traits::ContentStore;

/// Maps each `BackendKind` to the content store holding its blobs.
///
/// Built once at startup; a lookup for an unregistered backend is a
/// configuration error, not a missing-file condition.
#[derive(Clone)]
pub struct ContentBackends {
    stores: HashMap<BackendKind, Arc<dyn ContentStore>>,
}

impl ContentBackends {
    pub fn new() -> Self {
        Self {
            stores: HashMap::new(),
        }
    }

    /// All four backends, each backed by its own in-memory store.
    pub fn in_memory() -> Self {
        let mut backends = Self::new();
        for kind in BackendKind::all() {
            backends.register(kind, Arc::new(MemoryContentStore::new()));
        }
        backends
    }

    pub fn register(&mut self, kind: BackendKind, store: Arc<dyn ContentStore>) {
        self.stores.insert(kind, store);
    }

    pub fn get(&self, kind: BackendKind) -> StoreResult<Arc<dyn ContentStore>> {
        self.stores.get(&kind).cloned().ok_or_else(|| {
            StoreError::Config(format!("content backend not registered: {kind}"))
        })
    }
}

impl Default for ContentBackends {
    fn default() -> Self {
        Self::new()
    }
}
