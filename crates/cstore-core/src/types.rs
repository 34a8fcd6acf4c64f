use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One of the fixed physical content backends. Blobs are routed here by
/// MIME type; the chosen backend is recorded on the metadata row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    Image,
    Video,
    Audio,
    Document,
}

impl BackendKind {
    /// Stable store-level name, also the value persisted in metadata rows.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Image => "image_data",
            BackendKind::Video => "video_data",
            BackendKind::Audio => "audio_data",
            BackendKind::Document => "document_data",
        }
    }

    pub fn all() -> [BackendKind; 4] {
        [
            BackendKind::Image,
            BackendKind::Video,
            BackendKind::Audio,
            BackendKind::Document,
        ]
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse file category derived from the MIME type. Unlike `BackendKind`
/// this includes `Other`; files categorized `Other` still land in the
/// document backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileType::Image => "image",
            FileType::Video => "video",
            FileType::Audio => "audio",
            FileType::Document => "document",
            FileType::Other => "other",
        };
        f.write_str(s)
    }
}

/// Compression applied to the payload before encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionAlg {
    Zstd,
}

/// A file's metadata row. Plaintext fields only; the content itself lives
/// as ciphertext in the backend named by `backend`.
///
/// Rows are soft-deleted: `is_deleted` is flipped and the row retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_id: String,
    pub user_id: String,
    pub original_filename: String,
    pub size_bytes: u64,
    pub mime_type: Option<String>,
    pub file_type: FileType,
    /// `None` on legacy rows that predate backend recording; readers fall
    /// back to recomputing the backend from the MIME type.
    pub backend: Option<BackendKind>,
    pub parent_folder_id: String,
    pub compression: Option<CompressionAlg>,
    pub uploaded_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub is_deleted: bool,
}

/// What the uploader hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub file_id: String,
    pub filename: String,
    pub size: u64,
    pub mime_type: Option<String>,
    pub file_type: FileType,
    pub backend: BackendKind,
    pub uploaded_at: DateTime<Utc>,
}

/// Decrypted download result.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub content: Vec<u8>,
    pub filename: String,
    pub mime_type: Option<String>,
}

/// One page of a folder listing plus its pagination envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListing {
    pub rows: Vec<FileMetadata>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total: u64,
    pub has_more: bool,
    pub from_cache: bool,
}

/// Per-user storage accounting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageUsage {
    pub total_size: u64,
    pub total_files: u64,
    pub by_type: BTreeMap<FileType, TypeUsage>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TypeUsage {
    pub files: u64,
    pub bytes: u64,
}
