//! Per-build encryption key.
//!
//! The runtime uses the key to seal data it round-trips through the
//! browser. It travels in the manifest as lowercase hex and must import
//! back to the exact same bytes.

use super::ManifestError;
use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt;

/// Environment variable that pins the key across builds (hex).
pub const KEY_ENV: &str = "STRATA_KEY";

const KEY_CONTEXT: &str = "strata 2026-01-01 manifest encryption key";
const KEY_LEN: usize = 32;

/// 256-bit key handle.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Derive a key from arbitrary material.
    pub fn derive(material: &[u8]) -> Self {
        Self(blake3::derive_key(KEY_CONTEXT, material))
    }

    /// Fresh key for one build, read from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Key from [`KEY_ENV`] if set, otherwise a generated one.
    pub fn from_env_or_generate() -> Result<Self, ManifestError> {
        match std::env::var(KEY_ENV) {
            Ok(hex) if !hex.trim().is_empty() => Self::import(hex.trim()),
            _ => Ok(Self::generate()),
        }
    }

    /// Lowercase hex.
    pub fn export(&self) -> String {
        hex::encode(self.0)
    }

    pub fn import(encoded: &str) -> Result<Self, ManifestError> {
        let bytes = hex::decode(encoded).map_err(|e| ManifestError::InvalidKey {
            reason: e.to_string(),
        })?;
        let len = bytes.len();
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| ManifestError::InvalidKey {
            reason: format!("expected {KEY_LEN} bytes, got {len}"),
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

// Never print key material.
impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}
