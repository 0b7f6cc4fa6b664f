//! In-memory record store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ChangeSet, RecordStore, StoreError, Versioned};

/// Record store held entirely in memory.
///
/// Commits take the write lock for validation and application together, so
/// concurrent commits touching the same key are serialized and the later
/// one observes a version mismatch.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, Versioned>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(key).cloned())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut records = self.records.write().await;

        for (key, observed) in &changes.reads {
            let current = records.get(key).map(|v| v.version);
            if current != *observed {
                debug!(key = %key, ?observed, ?current, "Stale read-set, rejecting commit");
                return Err(StoreError::Conflict { key: key.clone() });
            }
        }

        for (key, value) in changes.writes {
            let version = records.get(&key).map_or(1, |v| v.version + 1);
            records.insert(key, Versioned { value, version });
        }

        Ok(())
    }
}
