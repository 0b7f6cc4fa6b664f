//! Batch lifecycle engine.
//!
//! Batches move forward through a fixed set of stages:
//!
//! ```text
//! originate ──► READY_FOR_DISTRIBUTION ──fair-trade──► CERTIFIED_FAIR_TRADE
//!                      │                                      │
//!                      └──────────── packing list ◄───────────┘
//!                                        │
//!                                        ▼
//!                                    IMPORTED ──weight tally──► WEIGHT_VERIFIED
//!                                                                    │
//!                                                                 cupping
//!                                                                    ▼
//!                               READY_FOR_SALE ◄──release── CUPPED
//! ```
//!
//! Every stage operation reads the latest batch, checks the current state,
//! merges its section into the record and writes the whole record back under
//! the same key. Participant ids, once recorded, cannot be changed by a later
//! stage.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::ContractConfig;
use crate::context::TxContext;
use crate::error::{require_non_empty, LedgerError};
use crate::id::BatchId;
use crate::registry::MemberRegistry;
use crate::types::{
    BatchState, CoffeeBatch, CuppingReport, FairTradeReport, MemberType, PackingList,
    PremiumInvestment, ShipmentCondition, WeightTally,
};

/// Allowed source states and the target state of a stage operation.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub operation: &'static str,
    pub from: &'static [BatchState],
    pub to: BatchState,
}

impl Transition {
    pub fn permits(&self, state: BatchState) -> bool {
        self.from.contains(&state)
    }

    fn allowed(&self) -> String {
        self.from
            .iter()
            .map(BatchState::as_str)
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

pub const FAIR_TRADE: Transition = Transition {
    operation: "submitFairTradeData",
    from: &[BatchState::ReadyForDistribution],
    to: BatchState::CertifiedFairTrade,
};

pub const PACKING_LIST: Transition = Transition {
    operation: "submitPackingList",
    from: &[BatchState::ReadyForDistribution, BatchState::CertifiedFairTrade],
    to: BatchState::Imported,
};

pub const WEIGHT_TALLY: Transition = Transition {
    operation: "submitWeightTally",
    from: &[BatchState::Imported],
    to: BatchState::WeightVerified,
};

pub const CUPPING: Transition = Transition {
    operation: "submitCupping",
    from: &[BatchState::WeightVerified],
    to: BatchState::Cupped,
};

pub const RELEASE_FOR_SALE: Transition = Transition {
    operation: "releaseForSale",
    from: &[BatchState::Cupped],
    to: BatchState::ReadyForSale,
};

// ============================================================================
// Inputs
// ============================================================================

/// Arguments of `submitFairTradeData`.
#[derive(Debug, Clone, Default)]
pub struct FairTradeInput {
    pub batch_id: String,
    pub report_name: String,
    pub org_description: String,
    pub report_year: String,
    pub fair_trade_premium_invested: String,
    /// `(title, amount)` pairs; fully empty pairs are skipped
    pub investments: [(String, String); 3],
}

/// Arguments of `submitPackingList`.
#[derive(Debug, Clone, Default)]
pub struct PackingListInput {
    pub batch_id: String,
    pub shipper_id: String,
    pub grower_id: String,
    pub issue_date: String,
    pub ico_num: String,
    pub ico_lot: String,
    pub fda_num: String,
    pub invoice_num: String,
    pub bill_of_lading_num: String,
    pub vessel_name: String,
    pub vessel_voyage_num: String,
    pub container_num: String,
    pub seal_num: String,
    pub timestamp: String,
}

/// Arguments of `submitWeightTally`.
#[derive(Debug, Clone, Default)]
pub struct WeightTallyInput {
    pub batch_id: String,
    pub trader_id: String,
    pub shipper_id: String,
    pub date_stripped: String,
    pub marks: String,
    pub bags_expected: String,
    pub condition: String,
    pub insect_activity: String,
}

/// Arguments of `submitCupping`.
#[derive(Debug, Clone, Default)]
pub struct CuppingInput {
    pub batch_id: String,
    pub trader_id: String,
    pub retailer_id: String,
    pub date_cupped: String,
    pub cupper: String,
    pub aroma: String,
    pub flavor: String,
    pub after_taste: String,
    pub acidity: String,
    pub body: String,
    pub final_score: String,
}

// ============================================================================
// Engine
// ============================================================================

pub struct BatchEngine<'a> {
    config: &'a ContractConfig,
    registry: MemberRegistry<'a>,
}

impl<'a> BatchEngine<'a> {
    pub fn new(config: &'a ContractConfig) -> Self {
        Self {
            config,
            registry: MemberRegistry::new(config),
        }
    }

    /// Create a batch under a freshly generated id.
    ///
    /// The id is checked against the store before the write; an occupied key
    /// fails with `IdGeneration` rather than overwriting.
    pub async fn originate(
        &self,
        ctx: &mut TxContext,
        batch_id: BatchId,
        size: &str,
        roast: &str,
        grower_id: &str,
    ) -> Result<CoffeeBatch, LedgerError> {
        require_non_empty("size", size)?;
        require_non_empty("roast", roast)?;
        require_non_empty("growerId", grower_id)?;
        self.registry
            .require_member(ctx, "growerId", grower_id, MemberType::Grower)
            .await?;

        let key = self.config.key_layout.batch_key(batch_id.as_str());
        if ctx.exists(&key).await? {
            warn!(batch_id = %batch_id, "Generated batch id already in use");
            return Err(LedgerError::IdGeneration { key });
        }

        let batch = CoffeeBatch {
            batch_id: batch_id.into_string(),
            size: size.to_string(),
            roast: roast.to_string(),
            owner: grower_id.to_string(),
            batch_state: BatchState::ReadyForDistribution,
            grower_id: grower_id.to_string(),
            shipper_id: None,
            trader_id: None,
            retailer_id: None,
            created_at: Utc::now(),
            fair_trade_report: None,
            packing_list: None,
            weight_tally: None,
            cupping: None,
        };
        ctx.put_record(&key, &batch)?;

        info!(batch_id = %batch.batch_id, grower_id = %grower_id, "Batch originated");
        Ok(batch)
    }

    pub async fn submit_fair_trade(
        &self,
        ctx: &mut TxContext,
        input: &FairTradeInput,
    ) -> Result<CoffeeBatch, LedgerError> {
        let (key, mut batch) = self.load(ctx, &input.batch_id, &FAIR_TRADE).await?;

        let mut investments = Vec::new();
        for (i, (title, amount)) in input.investments.iter().enumerate() {
            match (title.trim().is_empty(), amount.trim().is_empty()) {
                (true, true) => continue,
                (false, false) => investments.push(PremiumInvestment {
                    investment_title: title.clone(),
                    investment_amount: amount.clone(),
                }),
                _ => {
                    return Err(LedgerError::validation(
                        format!("investment{}", i + 1),
                        "title and amount must be given together",
                    ))
                }
            }
        }

        batch.fair_trade_report = Some(FairTradeReport {
            report_name: input.report_name.clone(),
            org_description: input.org_description.clone(),
            report_year: parse_field("reportYear", &input.report_year)?,
            fair_trade_premium_invested: input.fair_trade_premium_invested.clone(),
            investments,
        });

        self.commit_stage(ctx, &key, batch, &FAIR_TRADE)
    }

    /// Attach the packing list and move the batch to `IMPORTED`.
    ///
    /// The shipper takes custody at import; ownership passes to the trader at
    /// weight tally.
    pub async fn submit_packing_list(
        &self,
        ctx: &mut TxContext,
        input: &PackingListInput,
    ) -> Result<CoffeeBatch, LedgerError> {
        require_non_empty("shipperId", &input.shipper_id)?;
        require_non_empty("growerId", &input.grower_id)?;
        let (key, mut batch) = self.load(ctx, &input.batch_id, &PACKING_LIST).await?;

        if batch.grower_id != input.grower_id {
            return Err(LedgerError::validation(
                "growerId",
                format!("batch was originated by {}, not {}", batch.grower_id, input.grower_id),
            ));
        }
        record_participant("shipperId", &mut batch.shipper_id, &input.shipper_id)?;
        self.registry
            .require_member(ctx, "shipperId", &input.shipper_id, MemberType::Shipper)
            .await?;

        batch.packing_list = Some(PackingList {
            issue_date: input.issue_date.clone(),
            ico_num: input.ico_num.clone(),
            ico_lot: input.ico_lot.clone(),
            fda_num: input.fda_num.clone(),
            invoice_num: input.invoice_num.clone(),
            bill_of_lading_num: input.bill_of_lading_num.clone(),
            vessel_name: input.vessel_name.clone(),
            vessel_voyage_num: input.vessel_voyage_num.clone(),
            container_num: input.container_num.clone(),
            seal_num: input.seal_num.clone(),
            timestamp: input.timestamp.clone(),
        });
        batch.owner = input.shipper_id.clone();

        self.commit_stage(ctx, &key, batch, &PACKING_LIST)
    }

    pub async fn submit_weight_tally(
        &self,
        ctx: &mut TxContext,
        input: &WeightTallyInput,
    ) -> Result<CoffeeBatch, LedgerError> {
        require_non_empty("traderId", &input.trader_id)?;
        require_non_empty("shipperId", &input.shipper_id)?;
        let (key, mut batch) = self.load(ctx, &input.batch_id, &WEIGHT_TALLY).await?;

        record_participant("shipperId", &mut batch.shipper_id, &input.shipper_id)?;
        record_participant("traderId", &mut batch.trader_id, &input.trader_id)?;
        self.registry
            .require_member(ctx, "traderId", &input.trader_id, MemberType::Trader)
            .await?;

        batch.weight_tally = Some(WeightTally {
            date_stripped: input.date_stripped.clone(),
            marks: input.marks.clone(),
            bags_expected: parse_field("bagsExpected", &input.bags_expected)?,
            condition: input.condition.parse::<ShipmentCondition>()?,
            insect_activity: parse_flag("insectActivity", &input.insect_activity)?,
        });
        batch.owner = input.trader_id.clone();

        self.commit_stage(ctx, &key, batch, &WEIGHT_TALLY)
    }

    pub async fn submit_cupping(
        &self,
        ctx: &mut TxContext,
        input: &CuppingInput,
    ) -> Result<CoffeeBatch, LedgerError> {
        require_non_empty("traderId", &input.trader_id)?;
        require_non_empty("retailerId", &input.retailer_id)?;
        let (key, mut batch) = self.load(ctx, &input.batch_id, &CUPPING).await?;

        record_participant("traderId", &mut batch.trader_id, &input.trader_id)?;
        record_participant("retailerId", &mut batch.retailer_id, &input.retailer_id)?;
        self.registry
            .require_member(ctx, "retailerId", &input.retailer_id, MemberType::Retailer)
            .await?;

        batch.cupping = Some(CuppingReport {
            date_cupped: input.date_cupped.clone(),
            cupper: input.cupper.clone(),
            aroma: parse_score("aroma", &input.aroma)?,
            flavor: parse_score("flavor", &input.flavor)?,
            after_taste: parse_score("afterTaste", &input.after_taste)?,
            acidity: parse_score("acidity", &input.acidity)?,
            body: parse_score("body", &input.body)?,
            final_score: parse_score("finalScore", &input.final_score)?,
        });
        batch.owner = input.retailer_id.clone();

        self.commit_stage(ctx, &key, batch, &CUPPING)
    }

    /// Hand a cupped batch to its retailer for sale.
    pub async fn release_for_sale(
        &self,
        ctx: &mut TxContext,
        batch_id: &str,
        retailer_id: &str,
    ) -> Result<CoffeeBatch, LedgerError> {
        require_non_empty("retailerId", retailer_id)?;
        let (key, mut batch) = self.load(ctx, batch_id, &RELEASE_FOR_SALE).await?;

        record_participant("retailerId", &mut batch.retailer_id, retailer_id)?;
        batch.owner = retailer_id.to_string();

        self.commit_stage(ctx, &key, batch, &RELEASE_FOR_SALE)
    }

    /// Read the batch and check it may take `transition`.
    async fn load(
        &self,
        ctx: &mut TxContext,
        batch_id: &str,
        transition: &Transition,
    ) -> Result<(String, CoffeeBatch), LedgerError> {
        require_non_empty("batchId", batch_id)?;
        let key = self.config.key_layout.batch_key(batch_id);
        let batch: CoffeeBatch = ctx.get_record(&key).await?;

        if !transition.permits(batch.batch_state) {
            warn!(
                batch_id = %batch_id,
                state = %batch.batch_state,
                operation = transition.operation,
                "Rejected batch transition"
            );
            return Err(LedgerError::InvalidTransition {
                batch_id: batch_id.to_string(),
                operation: transition.operation,
                current: batch.batch_state,
                allowed: transition.allowed(),
            });
        }

        Ok((key, batch))
    }

    fn commit_stage(
        &self,
        ctx: &mut TxContext,
        key: &str,
        mut batch: CoffeeBatch,
        transition: &Transition,
    ) -> Result<CoffeeBatch, LedgerError> {
        debug!(
            batch_id = %batch.batch_id,
            from = %batch.batch_state,
            to = %transition.to,
            "Advancing batch"
        );
        batch.batch_state = transition.to;
        ctx.put_record(key, &batch)?;

        info!(
            batch_id = %batch.batch_id,
            operation = transition.operation,
            owner = %batch.owner,
            "Batch updated"
        );
        Ok(batch)
    }
}

/// Set a participant id, or check it against the one already recorded.
fn record_participant(
    field: &str,
    slot: &mut Option<String>,
    supplied: &str,
) -> Result<(), LedgerError> {
    match slot {
        Some(existing) if existing != supplied => Err(LedgerError::validation(
            field,
            format!("batch already records {existing}, got {supplied}"),
        )),
        Some(_) => Ok(()),
        None => {
            *slot = Some(supplied.to_string());
            Ok(())
        }
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, LedgerError> {
    raw.trim()
        .parse()
        .map_err(|_| LedgerError::validation(field, format!("'{raw}' is not a valid number")))
}

fn parse_score(field: &str, raw: &str) -> Result<f64, LedgerError> {
    let score: f64 = parse_field(field, raw)?;
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(LedgerError::validation(field, format!("{score} is outside 0-100")));
    }
    Ok(score)
}

fn parse_flag(field: &str, raw: &str) -> Result<bool, LedgerError> {
    match raw.trim().to_lowercase().as_str() {
        "yes" | "true" => Ok(true),
        "no" | "false" => Ok(false),
        other => Err(LedgerError::validation(
            field,
            format!("expected yes or no, got '{other}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::{MemoryStore, RecordStore};
    use std::sync::Arc;

    fn packing(batch_id: &str) -> PackingListInput {
        PackingListInput {
            batch_id: batch_id.to_string(),
            shipper_id: "s1".into(),
            grower_id: "g1".into(),
            issue_date: "2024-02-01".into(),
            ico_num: "ICO-010".into(),
            ico_lot: "0042".into(),
            fda_num: "FDA-77".into(),
            invoice_num: "INV-5".into(),
            bill_of_lading_num: "BOL-9".into(),
            vessel_name: "Cap San Marco".into(),
            vessel_voyage_num: "011E".into(),
            container_num: "TGHU0000001".into(),
            seal_num: "SL-1".into(),
            timestamp: "2024-02-01T08:00:00Z".into(),
        }
    }

    fn tally(batch_id: &str) -> WeightTallyInput {
        WeightTallyInput {
            batch_id: batch_id.to_string(),
            trader_id: "t1".into(),
            shipper_id: "s1".into(),
            date_stripped: "2024-03-10".into(),
            marks: "none".into(),
            bags_expected: "320".into(),
            condition: "Good".into(),
            insect_activity: "no".into(),
        }
    }

    async fn originate(store: &Arc<MemoryStore>, config: &ContractConfig) -> String {
        let mut ctx = TxContext::new(store.clone());
        let batch = BatchEngine::new(config)
            .originate(&mut ctx, BatchId::generate("g1"), "60kg", "light", "g1")
            .await
            .unwrap();
        ctx.commit().await.unwrap();
        batch.batch_id
    }

    #[tokio::test]
    async fn test_originate_sets_initial_state() {
        let store = Arc::new(MemoryStore::new());
        let config = ContractConfig::default();
        let id = originate(&store, &config).await;

        let mut ctx = TxContext::new(store.clone());
        let batch: CoffeeBatch = ctx.get_record(&id).await.unwrap();
        assert_eq!(batch.batch_state, BatchState::ReadyForDistribution);
        assert_eq!(batch.owner, "g1");
        assert_eq!(batch.grower_id, "g1");
    }

    #[tokio::test]
    async fn test_originate_collision_is_id_generation_error() {
        let store = Arc::new(MemoryStore::new());
        let config = ContractConfig::default();
        let id = originate(&store, &config).await;

        let mut ctx = TxContext::new(store.clone());
        let err = BatchEngine::new(&config)
            .originate(&mut ctx, BatchId::from(id.clone()), "60kg", "dark", "g2")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::IdGeneration { ref key } if *key == id));
    }

    #[tokio::test]
    async fn test_fair_trade_merges_and_advances() {
        let store = Arc::new(MemoryStore::new());
        let config = ContractConfig::default();
        let id = originate(&store, &config).await;

        let input = FairTradeInput {
            batch_id: id.clone(),
            report_name: "Annual Report".into(),
            org_description: "Smallholder co-op".into(),
            report_year: "2023".into(),
            fair_trade_premium_invested: "12000".into(),
            investments: [
                ("School roof".into(), "5000".into()),
                ("Washing station".into(), "7000".into()),
                (String::new(), String::new()),
            ],
        };
        let mut ctx = TxContext::new(store.clone());
        let batch = BatchEngine::new(&config)
            .submit_fair_trade(&mut ctx, &input)
            .await
            .unwrap();
        ctx.commit().await.unwrap();

        assert_eq!(batch.batch_state, BatchState::CertifiedFairTrade);
        assert_eq!(batch.size, "60kg");
        assert_eq!(batch.roast, "light");
        assert_eq!(batch.owner, "g1");
        let report = batch.fair_trade_report.unwrap();
        assert_eq!(report.report_year, 2023);
        assert_eq!(report.investments.len(), 2);
    }

    #[tokio::test]
    async fn test_half_filled_investment_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let config = ContractConfig::default();
        let id = originate(&store, &config).await;

        let input = FairTradeInput {
            batch_id: id,
            report_year: "2023".into(),
            investments: [
                ("Clinic".into(), String::new()),
                (String::new(), String::new()),
                (String::new(), String::new()),
            ],
            ..Default::default()
        };
        let mut ctx = TxContext::new(store.clone());
        let err = BatchEngine::new(&config)
            .submit_fair_trade(&mut ctx, &input)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { ref field, .. } if field == "investment1"));
    }

    #[tokio::test]
    async fn test_weight_tally_before_packing_list_leaves_record_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let config = ContractConfig::default();
        let id = originate(&store, &config).await;
        let before = store.read(&id).await.unwrap().unwrap();

        let mut ctx = TxContext::new(store.clone());
        let err = BatchEngine::new(&config)
            .submit_weight_tally(&mut ctx, &tally(&id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(ctx.pending_keys().count(), 0);
        drop(ctx);

        assert_eq!(store.read(&id).await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn test_packing_list_accepted_from_either_pre_import_state() {
        let store = Arc::new(MemoryStore::new());
        let config = ContractConfig::default();
        let id = originate(&store, &config).await;

        let mut ctx = TxContext::new(store.clone());
        let batch = BatchEngine::new(&config)
            .submit_packing_list(&mut ctx, &packing(&id))
            .await
            .unwrap();
        ctx.commit().await.unwrap();

        assert_eq!(batch.batch_state, BatchState::Imported);
        assert_eq!(batch.owner, "s1");
        assert_eq!(batch.shipper_id.as_deref(), Some("s1"));
        assert_eq!(batch.packing_list.unwrap().ico_lot, "0042");

        // A second packing list is not a forward move.
        let mut ctx = TxContext::new(store.clone());
        let err = BatchEngine::new(&config)
            .submit_packing_list(&mut ctx, &packing(&id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[tokio::test]
    async fn test_packing_list_rejects_foreign_grower() {
        let store = Arc::new(MemoryStore::new());
        let config = ContractConfig::default();
        let id = originate(&store, &config).await;

        let mut input = packing(&id);
        input.grower_id = "g9".into();
        let mut ctx = TxContext::new(store.clone());
        let err = BatchEngine::new(&config)
            .submit_packing_list(&mut ctx, &input)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { ref field, .. } if field == "growerId"));
    }

    #[tokio::test]
    async fn test_weight_tally_validates_fields() {
        let store = Arc::new(MemoryStore::new());
        let config = ContractConfig::default();
        let id = originate(&store, &config).await;
        let mut ctx = TxContext::new(store.clone());
        BatchEngine::new(&config)
            .submit_packing_list(&mut ctx, &packing(&id))
            .await
            .unwrap();
        ctx.commit().await.unwrap();

        let mut bad = tally(&id);
        bad.bags_expected = "lots".into();
        let mut ctx = TxContext::new(store.clone());
        let err = BatchEngine::new(&config)
            .submit_weight_tally(&mut ctx, &bad)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { ref field, .. } if field == "bagsExpected"));

        let mut ctx = TxContext::new(store.clone());
        let batch = BatchEngine::new(&config)
            .submit_weight_tally(&mut ctx, &tally(&id))
            .await
            .unwrap();
        assert_eq!(batch.batch_state, BatchState::WeightVerified);
        assert_eq!(batch.owner, "t1");
        let tally = batch.weight_tally.unwrap();
        assert_eq!(tally.bags_expected, 320);
        assert_eq!(tally.condition, ShipmentCondition::Good);
        assert!(!tally.insect_activity);
    }

    #[tokio::test]
    async fn test_missing_batch_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let config = ContractConfig::default();
        let mut ctx = TxContext::new(store.clone());
        let err = BatchEngine::new(&config)
            .release_for_sale(&mut ctx, "nope", "r1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_score_bounds() {
        assert_eq!(parse_score("aroma", " 8.25 ").unwrap(), 8.25);
        assert!(parse_score("aroma", "101").is_err());
        assert!(parse_score("aroma", "NaN").is_err());
        assert!(parse_score("aroma", "-1").is_err());
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag("insectActivity", "YES").unwrap());
        assert!(!parse_flag("insectActivity", "false").unwrap());
        assert!(parse_flag("insectActivity", "maybe").is_err());
    }

    #[test]
    fn test_transition_table_is_forward_only() {
        for t in [FAIR_TRADE, PACKING_LIST, WEIGHT_TALLY, CUPPING, RELEASE_FOR_SALE] {
            assert!(!t.permits(t.to), "{} must not re-enter {}", t.operation, t.to);
        }
        assert!(PACKING_LIST.permits(BatchState::CertifiedFairTrade));
        assert!(!FAIR_TRADE.permits(BatchState::Imported));
    }
}
