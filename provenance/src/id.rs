//! Batch identifier generation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hex characters kept from the digest (128 bits).
const BATCH_ID_HEX_LEN: usize = 32;

/// Identifier of a coffee batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(String);

impl BatchId {
    /// Derive a fresh id for a batch originated by `grower_id` now.
    pub fn generate(grower_id: &str) -> Self {
        Self::derive(grower_id, Utc::now(), Uuid::new_v4())
    }

    /// SHA-256 over grower, creation time and nonce, truncated to 128 bits.
    pub fn derive(grower_id: &str, created_at: DateTime<Utc>, nonce: Uuid) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(grower_id.as_bytes());
        hasher.update(b"|");
        hasher.update(created_at.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
        hasher.update(b"|");
        hasher.update(nonce.as_bytes());
        let mut hex = hex::encode(hasher.finalize());
        hex.truncate(BATCH_ID_HEX_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BatchId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for BatchId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_derive_is_deterministic() {
        let at = Utc::now();
        let nonce = Uuid::new_v4();
        assert_eq!(BatchId::derive("g1", at, nonce), BatchId::derive("g1", at, nonce));
        assert_ne!(BatchId::derive("g1", at, nonce), BatchId::derive("g2", at, nonce));
        assert_ne!(
            BatchId::derive("g1", at, nonce),
            BatchId::derive("g1", at, Uuid::new_v4())
        );
    }

    #[test]
    fn test_generate_has_fixed_hex_shape() {
        let id = BatchId::generate("grower-1");
        assert_eq!(id.as_str().len(), BATCH_ID_HEX_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_same_grower_same_instant_differs() {
        let ids: HashSet<BatchId> = (0..1000).map(|_| BatchId::generate("grower-1")).collect();
        assert_eq!(ids.len(), 1000);
    }
}
