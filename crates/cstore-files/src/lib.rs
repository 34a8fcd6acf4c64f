//! cstore-files: the encrypted file store's orchestration layer
//!
//! Wires the crypto primitives, the collaborator stores, the MIME router,
//! and the page cache into the five public operations: upload, download,
//! delete, list_page, storage_usage.
//!
//! Pipeline on upload: generate file id → generate content key →
//! (optionally compress) → encrypt → persist metadata → persist ciphertext
//! to the routed backend → persist wrapped key. A failure after the metadata
//! write compensates by taking the row back out, so metadata never points at
//! content or keys that were never stored.

pub mod download;
pub mod keymanager;
pub mod service;
pub mod upload;

pub use download::Downloader;
pub use keymanager::KeyManager;
pub use service::FileService;
pub use upload::{UploadRequest, Uploader};
