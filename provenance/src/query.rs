//! Read-only access to stored records.

use tracing::debug;

use crate::config::ContractConfig;
use crate::context::TxContext;
use crate::error::LedgerError;
use crate::types::{CoffeeBatch, CupPour, Member};

pub struct QueryGateway<'a> {
    config: &'a ContractConfig,
}

impl<'a> QueryGateway<'a> {
    pub fn new(config: &'a ContractConfig) -> Self {
        Self { config }
    }

    /// Stored record at the raw `key`, unmodified.
    pub async fn query(&self, ctx: &mut TxContext, key: &str) -> Result<String, LedgerError> {
        debug!(key = %key, "Query by key");
        let bytes = ctx
            .get(key)
            .await?
            .ok_or_else(|| LedgerError::NotFound { key: key.to_string() })?;
        String::from_utf8(bytes).map_err(|e| LedgerError::serialization(key, e))
    }

    pub async fn member(&self, ctx: &mut TxContext, id: &str) -> Result<Member, LedgerError> {
        ctx.get_record(&self.config.key_layout.member_key(id)).await
    }

    pub async fn batch(&self, ctx: &mut TxContext, batch_id: &str) -> Result<CoffeeBatch, LedgerError> {
        ctx.get_record(&self.config.key_layout.batch_key(batch_id)).await
    }

    pub async fn pour(&self, ctx: &mut TxContext, cup_id: &str) -> Result<CupPour, LedgerError> {
        ctx.get_record(&self.config.key_layout.pour_key(cup_id)).await
    }
}
