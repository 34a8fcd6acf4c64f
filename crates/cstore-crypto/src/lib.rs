//! cstore-crypto: envelope encryption for stored file content
//!
//! Key hierarchy:
//! ```text
//! Master Key (256-bit, loaded once at process start from config/env)
//!   └── Content Key (per-file, 256-bit random, wrapped by master key)
//!       └── Payload AEAD: XChaCha20-Poly1305 (nonce=random_192bit)
//! ```
//!
//! Both the wrapped key and the encrypted payload are self-describing:
//! `[24-byte nonce][ciphertext][16-byte tag]`, so decryption needs nothing
//! beyond the key itself.

pub mod content;
pub mod keys;
pub mod master;

pub use content::{decrypt_payload, encrypt_payload};
pub use keys::{generate_content_key, unwrap_key, wrap_key, FileKey, MasterKey};
pub use master::{generate_master_key_b64, load_master_key};

/// Size of a key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;
