//! Payload encryption/decryption with XChaCha20-Poly1305
//!
//! Encrypted payload format (binary):
//! ```text
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! ```
//!
//! The nonce travels with the ciphertext, so a blob can be decrypted with
//! the content key alone.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use cstore_core::{StoreError, StoreResult};

use crate::keys::FileKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// Encrypt a file payload with a per-file content key.
///
/// Returns `[24-byte nonce][ciphertext][16-byte tag]`.
pub fn encrypt_payload(key: &FileKey, plaintext: &[u8]) -> StoreResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| StoreError::Crypto(format!("payload encryption failed: {e}")))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypt a stored payload with its content key.
///
/// Input must be `[24-byte nonce][ciphertext][16-byte tag]`. Authentication
/// failure means a tampered blob or the wrong key.
pub fn decrypt_payload(key: &FileKey, encrypted: &[u8]) -> StoreResult<Vec<u8>> {
    if encrypted.len() < NONCE_SIZE + TAG_SIZE {
        return Err(StoreError::Crypto(format!(
            "encrypted payload too short: {} bytes (minimum {})",
            encrypted.len(),
            NONCE_SIZE + TAG_SIZE
        )));
    }

    let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
    let nonce = XNonce::from_slice(nonce_bytes);
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| StoreError::Crypto("tampered or wrong key".into()))
}

/// Fixed per-payload size overhead of the cipher framing.
pub const fn ciphertext_overhead() -> usize {
    NONCE_SIZE + TAG_SIZE
}
