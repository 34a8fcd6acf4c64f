//! Master key initialization from configuration or environment

use base64::Engine;
use rand::RngCore;
use tracing::warn;

use cstore_core::config::CryptoConfig;
use cstore_core::{StoreError, StoreResult};

use crate::keys::MasterKey;
use crate::KEY_SIZE;

/// Environment variable consulted when `crypto.master_key` is unset.
pub const MASTER_KEY_ENV: &str = "CSTORE_MASTER_KEY";

/// Load the master key at process start.
///
/// Resolution order: `crypto.master_key` from config, then the
/// `CSTORE_MASTER_KEY` environment variable, both base64-encoded 32-byte
/// values. A missing key is a hard configuration error: silently generating
/// a fresh key would make every previously wrapped content key unrecoverable
/// after restart. `allow_ephemeral_master_key` opts into exactly that for
/// local development, with a loud warning.
pub fn load_master_key(config: &CryptoConfig) -> StoreResult<MasterKey> {
    let configured = config
        .master_key
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var(MASTER_KEY_ENV).ok().filter(|s| !s.is_empty()));

    match configured {
        Some(encoded) => decode_master_key(&encoded),
        None if config.allow_ephemeral_master_key => {
            warn!(
                "no master key configured; using an ephemeral key, wrapped \
                 content keys will be unrecoverable after restart"
            );
            let mut bytes = [0u8; KEY_SIZE];
            rand::thread_rng().fill_bytes(&mut bytes);
            Ok(MasterKey::from_bytes(bytes))
        }
        None => Err(StoreError::Config(format!(
            "no master key configured: set crypto.master_key or {MASTER_KEY_ENV} \
             (base64, 32 bytes), or enable allow_ephemeral_master_key for local dev"
        ))),
    }
}

/// Generate a fresh base64-encoded master key, for provisioning.
pub fn generate_master_key_b64() -> String {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn decode_master_key(encoded: &str) -> StoreResult<MasterKey> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| StoreError::Config(format!("master key is not valid base64: {e}")))?;

    if decoded.len() != KEY_SIZE {
        return Err(StoreError::Config(format!(
            "master key must decode to {KEY_SIZE} bytes, got {}",
            decoded.len()
        )));
    }

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&decoded);
    Ok(MasterKey::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(master_key: Option<String>, ephemeral: bool) -> CryptoConfig {
        CryptoConfig {
            master_key,
            allow_ephemeral_master_key: ephemeral,
        }
    }

    #[test]
    fn load_from_config_value() {
        let encoded = generate_master_key_b64();
        let key = load_master_key(&config(Some(encoded.clone()), false)).unwrap();
        let again = load_master_key(&config(Some(encoded), false)).unwrap();
        assert_eq!(key.as_bytes(), again.as_bytes());
    }

    #[test]
    fn missing_key_is_a_hard_error() {
        let result = load_master_key(&config(None, false));
        match result {
            Err(StoreError::Config(msg)) => assert!(msg.contains("master key")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn ephemeral_fallback_when_allowed() {
        let key = load_master_key(&config(None, true)).unwrap();
        assert_eq!(key.as_bytes().len(), KEY_SIZE);
    }

    #[test]
    fn rejects_bad_base64() {
        let result = load_master_key(&config(Some("not-base64!!!".into()), false));
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn rejects_wrong_length() {
        let short = base64::engine::general_purpose::STANDARD.encode([0u8; 8]);
        let result = load_master_key(&config(Some(short), false));
        assert!(matches!(result, Err(StoreError::Config(_))));
    }
}
