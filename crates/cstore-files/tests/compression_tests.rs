//! Compression band behavior: applied only when enabled, inside the size
//! band, and on MIME types that are not already compressed.

mod common;

use common::{harness_with, request};
use cstore_core::types::{BackendKind, CompressionAlg};
use cstore_store::{ContentStore, MetadataStore};

fn enable_compression(config: &mut cstore_core::config::StoreConfig) {
    config.compression.enabled = true;
    config.compression.min_size = 1024;
    config.compression.max_size = 10 * 1024 * 1024;
}

#[tokio::test]
async fn compressible_payload_roundtrips_and_shrinks_on_disk() {
    let h = harness_with(enable_compression);
    // Highly repetitive payload, well inside the band
    let payload = b"all work and no play makes jack a dull boy\n".repeat(1024);

    let descriptor = h
        .service
        .upload(request("u1", &payload, "novel.txt", Some("text/plain"), "root"))
        .await
        .unwrap();

    let row = h
        .metadata
        .query_by_id(&descriptor.file_id, "u1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.compression, Some(CompressionAlg::Zstd));
    assert_eq!(row.size_bytes, payload.len() as u64, "size records the original");

    let blob = h.backends[&BackendKind::Document]
        .get(&descriptor.file_id)
        .await
        .unwrap()
        .unwrap();
    assert!(blob.len() < payload.len(), "stored blob should be smaller");

    let downloaded = h.service.download(&descriptor.file_id, "u1").await.unwrap();
    assert_eq!(downloaded.content, payload);
}

#[tokio::test]
async fn small_payload_is_not_compressed() {
    let h = harness_with(enable_compression);
    let payload = b"tiny".to_vec();

    let descriptor = h
        .service
        .upload(request("u1", &payload, "t.txt", Some("text/plain"), "root"))
        .await
        .unwrap();

    let row = h
        .metadata
        .query_by_id(&descriptor.file_id, "u1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.compression, None);

    let downloaded = h.service.download(&descriptor.file_id, "u1").await.unwrap();
    assert_eq!(downloaded.content, payload);
}

#[tokio::test]
async fn already_compressed_mime_is_skipped() {
    let h = harness_with(enable_compression);
    let payload = vec![7u8; 64 * 1024];

    let descriptor = h
        .service
        .upload(request("u1", &payload, "p.jpeg", Some("image/jpeg"), "root"))
        .await
        .unwrap();

    let row = h
        .metadata
        .query_by_id(&descriptor.file_id, "u1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.compression, None);

    let downloaded = h.service.download(&descriptor.file_id, "u1").await.unwrap();
    assert_eq!(downloaded.content, payload);
}

#[tokio::test]
async fn disabled_compression_never_marks_rows() {
    let h = common::harness();
    let payload = b"compress me please ".repeat(4096);

    let descriptor = h
        .service
        .upload(request("u1", &payload, "big.txt", Some("text/plain"), "root"))
        .await
        .unwrap();

    let row = h
        .metadata
        .query_by_id(&descriptor.file_id, "u1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.compression, None);
}
