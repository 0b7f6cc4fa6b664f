//! Durable record store backed by sled.
//!
//! Each value is stored as an 8-byte big-endian version followed by the
//! record bytes, so a versioned read is a single lookup.

use async_trait::async_trait;
use sled::transaction::{
    abort, ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ChangeSet, RecordStore, StoreError, Versioned};

const VERSION_LEN: usize = 8;

/// sled releases its file lock from background threads after the last
/// handle drops, so a reopen in the same process can briefly see it held.
const LOCK_RETRIES: u32 = 50;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(20);

/// Record store persisted in a sled database.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
    records: sled::Tree,
}

impl SledStore {
    /// Open or create a store at `path`.
    ///
    /// Waits up to one second for a lock still held by a store dropped in
    /// this process. Writes reach disk on [`SledStore::flush`] or sled's
    /// periodic flush.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let mut attempt = 0;
        let db = loop {
            match sled::Config::new().path(path).open() {
                Ok(db) => break db,
                Err(err) if attempt < LOCK_RETRIES && is_lock_contention(&err) => {
                    attempt += 1;
                    warn!(path = %path.display(), attempt, "Record store locked, retrying");
                    std::thread::sleep(LOCK_RETRY_DELAY);
                }
                Err(err) => return Err(backend(err)),
            }
        };
        let records = db.open_tree("records").map_err(backend)?;

        info!(path = %path.display(), "Opened record store");
        Ok(Self { db, records })
    }

    /// Flush outstanding writes to disk.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.db.flush_async().await.map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SledStore {
    async fn read(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        match self.records.get(key.as_bytes()).map_err(backend)? {
            Some(raw) => decode(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let result = self.records.transaction(|tx| -> ConflictableTransactionResult<(), StoreError> {
            for (key, observed) in &changes.reads {
                let current = match tx.get(key.as_bytes())? {
                    Some(raw) => Some(decode(key, &raw).map_err(ConflictableTransactionError::Abort)?.version),
                    None => None,
                };
                if current != *observed {
                    return abort(StoreError::Conflict { key: key.clone() });
                }
            }

            for (key, value) in &changes.writes {
                let version = match tx.get(key.as_bytes())? {
                    Some(raw) => decode(key, &raw).map_err(ConflictableTransactionError::Abort)?.version + 1,
                    None => 1,
                };
                tx.insert(key.as_bytes(), encode(version, value))?;
            }

            Ok(())
        });

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(err)) => {
                debug!(error = %err, "Commit aborted");
                Err(err)
            }
            Err(TransactionError::Storage(err)) => Err(backend(err)),
        }
    }
}

fn is_lock_contention(err: &sled::Error) -> bool {
    match err {
        sled::Error::Io(io) => {
            io.kind() == std::io::ErrorKind::WouldBlock || io.to_string().contains("acquire lock")
        }
        _ => false,
    }
}

fn encode(version: u64, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(VERSION_LEN + value.len());
    out.extend_from_slice(&version.to_be_bytes());
    out.extend_from_slice(value);
    out
}

fn decode(key: &str, raw: &[u8]) -> Result<Versioned, StoreError> {
    if raw.len() < VERSION_LEN {
        return Err(StoreError::Backend(format!("corrupt record at key {key}")));
    }
    let (prefix, value) = raw.split_at(VERSION_LEN);
    let mut version = [0u8; VERSION_LEN];
    version.copy_from_slice(prefix);
    Ok(Versioned {
        value: value.to_vec(),
        version: u64::from_be_bytes(version),
    })
}

fn backend(err: sled::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}
