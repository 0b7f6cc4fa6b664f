//! Per-invocation read/write context.
//!
//! A [`TxContext`] is the `get`/`put` surface each operation sees. Reads
//! go to the store and record the version observed; writes are buffered
//! until [`TxContext::commit`] submits them together with the read-set.
//! Dropping a context without committing leaves the store untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::LedgerError;
use crate::store::{ChangeSet, RecordStore, StoreError};

pub struct TxContext {
    store: Arc<dyn RecordStore>,
    reads: BTreeMap<String, Option<u64>>,
    writes: BTreeMap<String, Vec<u8>>,
}

impl TxContext {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Raw bytes at `key`, or `None` when absent.
    ///
    /// Returns this invocation's own buffered write if there is one.
    pub async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(pending) = self.writes.get(key) {
            return Ok(Some(pending.clone()));
        }

        let stored = self.store.read(key).await?;
        // First observation wins; later reads of the same key must not
        // refresh the version the commit is validated against.
        self.reads
            .entry(key.to_string())
            .or_insert_with(|| stored.as_ref().map(|v| v.version));

        debug!(key = %key, found = stored.is_some(), "Read record");
        Ok(stored.map(|v| v.value))
    }

    /// Buffer a full replacement value for `key`.
    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.writes.insert(key.into(), value);
    }

    /// Read and decode a record, failing with `NotFound` when absent.
    pub async fn get_record<T: DeserializeOwned>(&mut self, key: &str) -> Result<T, LedgerError> {
        let bytes = self
            .get(key)
            .await?
            .ok_or_else(|| LedgerError::NotFound { key: key.to_string() })?;
        serde_json::from_slice(&bytes).map_err(|e| LedgerError::serialization(key, e))
    }

    /// Read and decode a record that may be absent.
    pub async fn find_record<T: DeserializeOwned>(
        &mut self,
        key: &str,
    ) -> Result<Option<T>, LedgerError> {
        match self.get(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| LedgerError::serialization(key, e)),
            None => Ok(None),
        }
    }

    /// Whether `key` currently holds a value. Records the read.
    pub async fn exists(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Encode and buffer a full record.
    pub fn put_record<T: Serialize>(&mut self, key: &str, record: &T) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec(record).map_err(|e| LedgerError::serialization(key, e))?;
        self.put(key, bytes);
        Ok(())
    }

    /// Keys written so far.
    pub fn pending_keys(&self) -> impl Iterator<Item = &str> {
        self.writes.keys().map(String::as_str)
    }

    /// Submit the read-set and write-set.
    ///
    /// A context with no writes commits nothing.
    pub async fn commit(self) -> Result<(), StoreError> {
        let changes = ChangeSet {
            reads: self.reads,
            writes: self.writes,
        };
        if changes.is_read_only() {
            return Ok(());
        }
        self.store.commit(changes).await
    }
}
