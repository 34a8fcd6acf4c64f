//! MIME-type routing: which backend a blob lands in, and the coarse file
//! category recorded on its metadata row.
//!
//! `backend_for` is total: every input (including a missing MIME type) maps
//! to exactly one backend, defaulting to the document backend.

use cstore_core::types::{BackendKind, FileType};

/// Exact-match MIME → backend table. Anything absent routes to `Document`.
const MIME_TABLE: &[(&str, BackendKind)] = &[
    ("image/jpeg", BackendKind::Image),
    ("image/png", BackendKind::Image),
    ("image/gif", BackendKind::Image),
    ("image/webp", BackendKind::Image),
    ("video/mp4", BackendKind::Video),
    ("video/avi", BackendKind::Video),
    ("video/mov", BackendKind::Video),
    ("audio/mp3", BackendKind::Audio),
    ("audio/mpeg", BackendKind::Audio),
    ("audio/wav", BackendKind::Audio),
    ("audio/ogg", BackendKind::Audio),
    ("application/pdf", BackendKind::Document),
    ("application/msword", BackendKind::Document),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        BackendKind::Document,
    ),
    ("text/plain", BackendKind::Document),
    ("text/html", BackendKind::Document),
    ("application/zip", BackendKind::Document),
    ("application/x-rar-compressed", BackendKind::Document),
];

/// Resolve the content backend for a MIME type.
pub fn backend_for(mime_type: Option<&str>) -> BackendKind {
    let Some(mime) = mime_type else {
        return BackendKind::Document;
    };
    MIME_TABLE
        .iter()
        .find(|(m, _)| *m == mime)
        .map(|(_, b)| *b)
        .unwrap_or(BackendKind::Document)
}

/// Derive the coarse file category from a MIME type.
pub fn file_type_for(mime_type: Option<&str>) -> FileType {
    let Some(mime) = mime_type else {
        return FileType::Other;
    };
    let lower = mime.to_ascii_lowercase();

    if lower.starts_with("image/") {
        FileType::Image
    } else if lower.starts_with("video/") {
        FileType::Video
    } else if lower.starts_with("audio/") {
        FileType::Audio
    } else if lower.starts_with("text/")
        || lower.contains("pdf")
        || lower.contains("document")
        || lower.contains("msword")
        || lower.contains("officedocument")
        || lower.contains("zip")
        || lower.contains("rar")
        || lower.contains("compressed")
    {
        FileType::Document
    } else {
        FileType::Other
    }
}
