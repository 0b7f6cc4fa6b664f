//! Pour ledger.
//!
//! A cup id encodes how the cup was served in its first three characters:
//!
//! | Position | Code | Meaning |
//! |---|---|---|
//! | 0 | `c` / `e` / other | Iced / Hot / Nitro |
//! | 1 | `j` / other | Josh / Siv |
//! | 2 | `b` / other | known origin / unset |
//!
//! Codes are compared after lowercasing.

use chrono::Utc;
use tracing::info;

use crate::config::{ContractConfig, PourCounting};
use crate::context::TxContext;
use crate::error::{require_non_empty, LedgerError};
use crate::types::{Barista, CupPour, DrinkType};

/// Fields decoded from a cup id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CupCode {
    pub drink_type: DrinkType,
    pub barista: Barista,
    pub bean_type: Option<String>,
}

/// Decode the first three characters of `cup_id`.
///
/// Missing positions decode the same as unrecognised codes.
pub fn decode_cup_id(cup_id: &str, origin_label: &str) -> CupCode {
    let mut codes = cup_id.chars().map(|c| c.to_lowercase().next().unwrap_or(c));

    let drink_type = match codes.next() {
        Some('c') => DrinkType::Iced,
        Some('e') => DrinkType::Hot,
        _ => DrinkType::Nitro,
    };
    let barista = match codes.next() {
        Some('j') => Barista::Josh,
        _ => Barista::Siv,
    };
    let bean_type = match codes.next() {
        Some('b') => Some(origin_label.to_string()),
        _ => None,
    };

    CupCode {
        drink_type,
        barista,
        bean_type,
    }
}

pub struct PourLedger<'a> {
    config: &'a ContractConfig,
}

impl<'a> PourLedger<'a> {
    pub fn new(config: &'a ContractConfig) -> Self {
        Self { config }
    }

    /// Record a pour of `cup_id`, replacing any earlier pour of the same cup.
    ///
    /// The key is read first in both counting modes, so a member or batch
    /// stored under the same key fails to decode and is never overwritten.
    pub async fn pour_cup(&self, ctx: &mut TxContext, cup_id: &str) -> Result<CupPour, LedgerError> {
        require_non_empty("cupId", cup_id)?;
        let key = self.config.key_layout.pour_key(cup_id);

        let previous = ctx.find_record::<CupPour>(&key).await?;
        let count = match (self.config.pour_counting, previous) {
            (PourCounting::Accumulate, Some(previous)) => previous.count.saturating_add(1),
            _ => 1,
        };

        let code = decode_cup_id(cup_id, &self.config.known_origin_label);
        let pour = CupPour {
            cup_id: cup_id.to_string(),
            drink_type: code.drink_type,
            barista: code.barista,
            bean_type: code.bean_type,
            last_pour: Utc::now(),
            count,
        };
        ctx.put_record(&key, &pour)?;

        info!(
            cup_id = %cup_id,
            drink_type = ?pour.drink_type,
            barista = ?pour.barista,
            count = pour.count,
            "Cup poured"
        );
        Ok(pour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ORIGIN_LABEL;
    use crate::error::ErrorKind;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_decode_known_codes() {
        let code = decode_cup_id("CJB001", DEFAULT_ORIGIN_LABEL);
        assert_eq!(code.drink_type, DrinkType::Iced);
        assert_eq!(code.barista, Barista::Josh);
        assert_eq!(code.bean_type.as_deref(), Some(DEFAULT_ORIGIN_LABEL));

        let code = decode_cup_id("ejx", DEFAULT_ORIGIN_LABEL);
        assert_eq!(code.drink_type, DrinkType::Hot);
        assert_eq!(code.barista, Barista::Josh);
        assert_eq!(code.bean_type, None);
    }

    #[test]
    fn test_decode_unknown_codes() {
        let code = decode_cup_id("xyz999", DEFAULT_ORIGIN_LABEL);
        assert_eq!(code.drink_type, DrinkType::Nitro);
        assert_eq!(code.barista, Barista::Siv);
        assert_eq!(code.bean_type, None);
    }

    #[test]
    fn test_decode_short_ids() {
        let code = decode_cup_id("E", DEFAULT_ORIGIN_LABEL);
        assert_eq!(code.drink_type, DrinkType::Hot);
        assert_eq!(code.barista, Barista::Siv);
        assert_eq!(code.bean_type, None);
    }

    async fn pour_twice(counting: PourCounting) -> CupPour {
        let store = Arc::new(MemoryStore::new());
        let config = ContractConfig {
            pour_counting: counting,
            ..Default::default()
        };
        let ledger = PourLedger::new(&config);
        for _ in 0..2 {
            let mut ctx = TxContext::new(store.clone());
            ledger.pour_cup(&mut ctx, "cjb7").await.unwrap();
            ctx.commit().await.unwrap();
        }
        let mut ctx = TxContext::new(store.clone());
        ctx.get_record("cjb7").await.unwrap()
    }

    #[tokio::test]
    async fn test_reset_counting_overwrites() {
        let pour = pour_twice(PourCounting::Reset).await;
        assert_eq!(pour.count, 1);
        assert_eq!(pour.drink_type, DrinkType::Iced);
    }

    #[tokio::test]
    async fn test_accumulate_counting_increments() {
        let pour = pour_twice(PourCounting::Accumulate).await;
        assert_eq!(pour.count, 2);
    }

    #[tokio::test]
    async fn test_pour_never_replaces_a_member() {
        let store = Arc::new(MemoryStore::new());
        let config = ContractConfig::default();
        let member = br#"{"id":"cjb7","organization":"Roastery","address":"Addis","memberType":"Retailer"}"#;

        let mut ctx = TxContext::new(store.clone());
        ctx.put("cjb7", member.to_vec());
        ctx.commit().await.unwrap();

        let mut ctx = TxContext::new(store.clone());
        let err = PourLedger::new(&config).pour_cup(&mut ctx, "cjb7").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert_eq!(ctx.pending_keys().count(), 0);

        let mut ctx = TxContext::new(store.clone());
        assert_eq!(ctx.get("cjb7").await.unwrap().as_deref(), Some(&member[..]));
    }

    #[tokio::test]
    async fn test_empty_cup_id_rejected() {
        let config = ContractConfig::default();
        let mut ctx = TxContext::new(Arc::new(MemoryStore::new()));
        let err = PourLedger::new(&config).pour_cup(&mut ctx, "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
