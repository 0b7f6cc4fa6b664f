//! Provenance ledger for a coffee supply chain.
//!
//! Participants (grower, shipper, trader, retailer) register as members,
//! growers originate coffee batches, and batches accumulate certification,
//! customs, inspection and cupping records as they move through the chain.
//! Served cups are recorded in a separate pour ledger.
//!
//! # Key Components
//!
//! - [`RecordStore`]: Versioned key-value contract of the host platform
//! - [`TxContext`]: Per-invocation `get`/`put` adapter with read-set tracking
//! - [`MemberRegistry`]: Immutable participant records
//! - [`BatchEngine`]: Batch origination and the forward-only stage machine
//! - [`PourLedger`]: Decodes cup identifiers into serving records
//! - [`QueryGateway`]: Raw and typed reads by key
//! - [`CoffeeContract`]: Named-operation invocation surface
//!
//! Every operation is a single read-modify-write over one [`TxContext`].
//! Stale read-sets are rejected by the store at commit time and surface as
//! [`LedgerError::CommitConflict`]; the caller decides whether to resubmit.
//!
//! # Example
//!
//! ```ignore
//! use provenance::{CoffeeContract, ContractConfig, MemoryStore};
//! use std::sync::Arc;
//!
//! let contract = CoffeeContract::new(Arc::new(MemoryStore::new()), ContractConfig::default());
//! contract.add_member(&MemberInput::new("grower-1", "Co-op", "Sidama", "grower")).await?;
//! let batch_id = contract.add_coffee("60kg", "light", "grower-1").await?;
//! let raw = contract.query(batch_id.as_str()).await?;
//! ```

pub mod batch;
pub mod config;
pub mod context;
pub mod contract;
pub mod error;
pub mod id;
pub mod keys;
pub mod pour;
pub mod query;
pub mod registry;
pub mod store;
pub mod types;

// Re-export main types
pub use batch::{BatchEngine, CuppingInput, FairTradeInput, PackingListInput, WeightTallyInput};
pub use config::{ContractConfig, PourCounting};
pub use context::TxContext;
pub use contract::CoffeeContract;
pub use error::{ErrorKind, LedgerError};
pub use id::BatchId;
pub use keys::KeyLayout;
pub use pour::PourLedger;
pub use query::QueryGateway;
pub use registry::{MemberInput, MemberRegistry};
pub use store::{ChangeSet, MemoryStore, RecordStore, StoreError, Versioned};
#[cfg(feature = "sled-store")]
pub use store::SledStore;
pub use types::*;
