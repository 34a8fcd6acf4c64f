//! Shared fixtures: a FileService wired to in-memory stores, with handles
//! kept on the concrete stores so tests can inspect and sabotage them.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use cstore_core::config::StoreConfig;
use cstore_core::types::BackendKind;
use cstore_crypto::generate_master_key_b64;
use cstore_files::{FileService, UploadRequest};
use cstore_store::{ContentBackends, MemoryContentStore, MemoryKeyStore, MemoryMetadataStore};

pub struct Harness {
    pub service: FileService,
    pub metadata: Arc<MemoryMetadataStore>,
    pub key_store: Arc<MemoryKeyStore>,
    pub backends: HashMap<BackendKind, Arc<MemoryContentStore>>,
}

pub fn harness() -> Harness {
    harness_with(|_| {})
}

pub fn harness_with(tweak: impl FnOnce(&mut StoreConfig)) -> Harness {
    let mut config = StoreConfig::default();
    config.crypto.master_key = Some(generate_master_key_b64());
    tweak(&mut config);

    let metadata = Arc::new(MemoryMetadataStore::new());
    let key_store = Arc::new(MemoryKeyStore::new());
    let metadata_dyn: Arc<dyn cstore_store::MetadataStore> = metadata.clone();
    let key_store_dyn: Arc<dyn cstore_store::KeyStore> = key_store.clone();

    let mut handles = HashMap::new();
    let mut backends = ContentBackends::new();
    for kind in BackendKind::all() {
        let store = Arc::new(MemoryContentStore::new());
        handles.insert(kind, Arc::clone(&store));
        backends.register(kind, store);
    }

    let service = FileService::new(
        &config,
        metadata_dyn,
        backends,
        key_store_dyn,
    )
    .expect("service construction");

    Harness {
        service,
        metadata,
        key_store,
        backends: handles,
    }
}

pub fn request(
    user_id: &str,
    bytes: &[u8],
    filename: &str,
    mime_type: Option<&str>,
    folder: &str,
) -> UploadRequest {
    UploadRequest {
        user_id: user_id.to_string(),
        bytes: bytes.to_vec(),
        original_filename: filename.to_string(),
        mime_type: mime_type.map(str::to_string),
        parent_folder_id: folder.to_string(),
    }
}
