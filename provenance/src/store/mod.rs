//! Versioned record store contract.
//!
//! The host platform owns durability and concurrency control. This module
//! only states what the ledger needs from it: a single flat keyspace, a
//! versioned read, and an all-or-nothing commit that rejects stale read-sets.

mod memory;
#[cfg(feature = "sled-store")]
mod sled_store;

pub use memory::MemoryStore;
#[cfg(feature = "sled-store")]
pub use sled_store::SledStore;

use async_trait::async_trait;
use std::collections::BTreeMap;

/// Error types for record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A key in the read-set changed before commit
    #[error("Commit conflict on key: {key}")]
    Conflict { key: String },

    /// Backend failure (I/O, corruption, closed database)
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// A stored value together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    /// Serialized record bytes
    pub value: Vec<u8>,
    /// Per-key version, bumped on every committed write
    pub version: u64,
}

/// Read-set and write-set of one invocation.
///
/// `reads` maps each observed key to the version seen, `None` when the key
/// was absent. `writes` holds the full replacement value of each written key.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub reads: BTreeMap<String, Option<u64>>,
    pub writes: BTreeMap<String, Vec<u8>>,
}

impl ChangeSet {
    /// True when nothing was written.
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Versioned key-value interface provided by the host platform.
///
/// Implementations must validate every entry of `ChangeSet::reads` against
/// the current versions and apply every entry of `ChangeSet::writes` as one
/// atomic step, or reject with [`StoreError::Conflict`] and apply nothing.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the latest committed value of `key`.
    async fn read(&self, key: &str) -> Result<Option<Versioned>, StoreError>;

    /// Validate the read-set and apply the write-set atomically.
    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;
}
