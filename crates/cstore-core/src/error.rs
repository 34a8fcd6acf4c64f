use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error taxonomy for the encrypted file store.
///
/// `NotFound` is a normal outcome for lookups against ids that were never
/// uploaded or were deleted; everything else signals an actual failure.
/// `ContentMissing` is the one consistency violation: a live metadata row
/// whose ciphertext blob is gone from its backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("file not found: {file_id}")]
    NotFound { file_id: String },

    #[error("content missing for file {file_id} in backend {backend}")]
    ContentMissing { file_id: String, backend: String },

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// True for outcomes the caller should treat as "no such file" rather
    /// than as a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguishable() {
        let err = StoreError::NotFound {
            file_id: "abc".into(),
        };
        assert!(err.is_not_found());
        assert!(!StoreError::Storage("boom".into()).is_not_found());
    }

    #[test]
    fn messages_carry_context() {
        let err = StoreError::ContentMissing {
            file_id: "f1".into(),
            backend: "image_data".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("f1"));
        assert!(msg.contains("image_data"));
    }
}
