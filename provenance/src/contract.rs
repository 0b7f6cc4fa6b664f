//! Invocation surface of the ledger.
//!
//! Each call opens one [`TxContext`], runs one component operation and
//! commits at most once. Nothing is retried here: a
//! [`LedgerError::CommitConflict`] goes back to the caller, who may resubmit
//! the same invocation against the fresh state.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::batch::{BatchEngine, CuppingInput, FairTradeInput, PackingListInput, WeightTallyInput};
use crate::config::ContractConfig;
use crate::context::TxContext;
use crate::error::LedgerError;
use crate::id::BatchId;
use crate::pour::PourLedger;
use crate::query::QueryGateway;
use crate::registry::{MemberInput, MemberRegistry};
use crate::store::RecordStore;
use crate::types::{CoffeeBatch, CupPour, Member};

/// Operation names accepted by [`CoffeeContract::invoke`].
pub const OPERATIONS: [&str; 9] = [
    "addMember",
    "addCoffee",
    "submitFairTradeData",
    "submitPackingList",
    "submitWeightTally",
    "submitCupping",
    "releaseForSale",
    "pourCup",
    "query",
];

/// The coffee provenance contract bound to a record store.
pub struct CoffeeContract {
    store: Arc<dyn RecordStore>,
    config: ContractConfig,
}

impl CoffeeContract {
    pub fn new(store: Arc<dyn RecordStore>, config: ContractConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    /// Open a context for a custom read-modify-write.
    pub fn begin(&self) -> TxContext {
        TxContext::new(self.store.clone())
    }

    async fn finish(&self, ctx: TxContext, operation: &str) -> Result<(), LedgerError> {
        ctx.commit().await.map_err(|err| {
            let err = LedgerError::from(err);
            warn!(operation = %operation, error = %err, "Commit rejected");
            err
        })
    }

    pub async fn add_member(&self, input: &MemberInput) -> Result<Member, LedgerError> {
        let mut ctx = self.begin();
        let member = MemberRegistry::new(&self.config).add_member(&mut ctx, input).await?;
        self.finish(ctx, "addMember").await?;
        Ok(member)
    }

    /// Originate a batch and return its generated id.
    pub async fn add_coffee(
        &self,
        size: &str,
        roast: &str,
        grower_id: &str,
    ) -> Result<BatchId, LedgerError> {
        let mut ctx = self.begin();
        let batch = BatchEngine::new(&self.config)
            .originate(&mut ctx, BatchId::generate(grower_id), size, roast, grower_id)
            .await?;
        self.finish(ctx, "addCoffee").await?;
        Ok(BatchId::from(batch.batch_id))
    }

    pub async fn submit_fair_trade_data(
        &self,
        input: &FairTradeInput,
    ) -> Result<CoffeeBatch, LedgerError> {
        let mut ctx = self.begin();
        let batch = BatchEngine::new(&self.config).submit_fair_trade(&mut ctx, input).await?;
        self.finish(ctx, "submitFairTradeData").await?;
        Ok(batch)
    }

    pub async fn submit_packing_list(
        &self,
        input: &PackingListInput,
    ) -> Result<CoffeeBatch, LedgerError> {
        let mut ctx = self.begin();
        let batch = BatchEngine::new(&self.config).submit_packing_list(&mut ctx, input).await?;
        self.finish(ctx, "submitPackingList").await?;
        Ok(batch)
    }

    pub async fn submit_weight_tally(
        &self,
        input: &WeightTallyInput,
    ) -> Result<CoffeeBatch, LedgerError> {
        let mut ctx = self.begin();
        let batch = BatchEngine::new(&self.config).submit_weight_tally(&mut ctx, input).await?;
        self.finish(ctx, "submitWeightTally").await?;
        Ok(batch)
    }

    pub async fn submit_cupping(&self, input: &CuppingInput) -> Result<CoffeeBatch, LedgerError> {
        let mut ctx = self.begin();
        let batch = BatchEngine::new(&self.config).submit_cupping(&mut ctx, input).await?;
        self.finish(ctx, "submitCupping").await?;
        Ok(batch)
    }

    pub async fn release_for_sale(
        &self,
        batch_id: &str,
        retailer_id: &str,
    ) -> Result<CoffeeBatch, LedgerError> {
        let mut ctx = self.begin();
        let batch = BatchEngine::new(&self.config)
            .release_for_sale(&mut ctx, batch_id, retailer_id)
            .await?;
        self.finish(ctx, "releaseForSale").await?;
        Ok(batch)
    }

    pub async fn pour_cup(&self, cup_id: &str) -> Result<CupPour, LedgerError> {
        let mut ctx = self.begin();
        let pour = PourLedger::new(&self.config).pour_cup(&mut ctx, cup_id).await?;
        self.finish(ctx, "pourCup").await?;
        Ok(pour)
    }

    /// Raw stored record at `key`.
    pub async fn query(&self, key: &str) -> Result<String, LedgerError> {
        let mut ctx = self.begin();
        QueryGateway::new(&self.config).query(&mut ctx, key).await
    }

    pub async fn member(&self, id: &str) -> Result<Member, LedgerError> {
        let mut ctx = self.begin();
        QueryGateway::new(&self.config).member(&mut ctx, id).await
    }

    pub async fn batch(&self, batch_id: &str) -> Result<CoffeeBatch, LedgerError> {
        let mut ctx = self.begin();
        QueryGateway::new(&self.config).batch(&mut ctx, batch_id).await
    }

    pub async fn pour(&self, cup_id: &str) -> Result<CupPour, LedgerError> {
        let mut ctx = self.begin();
        QueryGateway::new(&self.config).pour(&mut ctx, cup_id).await
    }

    /// Dispatch a named operation with positional string arguments.
    ///
    /// Returns the serialized record for `query`, the generated batch id for
    /// `addCoffee`, and `None` otherwise.
    pub async fn invoke(
        &self,
        operation: &str,
        args: &[String],
    ) -> Result<Option<String>, LedgerError> {
        debug!(operation = %operation, argc = args.len(), "Invoking operation");

        match operation {
            "addMember" => {
                let [id, organization, address, member_type] = expect_args::<4>(operation, args)?;
                self.add_member(&MemberInput::new(id, organization, address, member_type))
                    .await?;
                Ok(None)
            }
            "addCoffee" => {
                let [size, roast, grower_id] = expect_args::<3>(operation, args)?;
                let batch_id = self.add_coffee(size, roast, grower_id).await?;
                Ok(Some(batch_id.into_string()))
            }
            "submitFairTradeData" => {
                let [batch_id, report_name, org_description, report_year, premium, t1, a1, t2, a2, t3, a3] =
                    expect_args::<11>(operation, args)?;
                self.submit_fair_trade_data(&FairTradeInput {
                    batch_id: batch_id.clone(),
                    report_name: report_name.clone(),
                    org_description: org_description.clone(),
                    report_year: report_year.clone(),
                    fair_trade_premium_invested: premium.clone(),
                    investments: [
                        (t1.clone(), a1.clone()),
                        (t2.clone(), a2.clone()),
                        (t3.clone(), a3.clone()),
                    ],
                })
                .await?;
                Ok(None)
            }
            "submitPackingList" => {
                let [batch_id, shipper_id, grower_id, issue_date, ico_num, ico_lot, fda_num, invoice_num, bill_of_lading_num, vessel_name, vessel_voyage_num, container_num, seal_num, timestamp] =
                    expect_args::<14>(operation, args)?;
                self.submit_packing_list(&PackingListInput {
                    batch_id: batch_id.clone(),
                    shipper_id: shipper_id.clone(),
                    grower_id: grower_id.clone(),
                    issue_date: issue_date.clone(),
                    ico_num: ico_num.clone(),
                    ico_lot: ico_lot.clone(),
                    fda_num: fda_num.clone(),
                    invoice_num: invoice_num.clone(),
                    bill_of_lading_num: bill_of_lading_num.clone(),
                    vessel_name: vessel_name.clone(),
                    vessel_voyage_num: vessel_voyage_num.clone(),
                    container_num: container_num.clone(),
                    seal_num: seal_num.clone(),
                    timestamp: timestamp.clone(),
                })
                .await?;
                Ok(None)
            }
            "submitWeightTally" => {
                let [batch_id, trader_id, shipper_id, date_stripped, marks, bags_expected, condition, insect_activity] =
                    expect_args::<8>(operation, args)?;
                self.submit_weight_tally(&WeightTallyInput {
                    batch_id: batch_id.clone(),
                    trader_id: trader_id.clone(),
                    shipper_id: shipper_id.clone(),
                    date_stripped: date_stripped.clone(),
                    marks: marks.clone(),
                    bags_expected: bags_expected.clone(),
                    condition: condition.clone(),
                    insect_activity: insect_activity.clone(),
                })
                .await?;
                Ok(None)
            }
            "submitCupping" => {
                let [batch_id, trader_id, retailer_id, date_cupped, cupper, aroma, flavor, after_taste, acidity, body, final_score] =
                    expect_args::<11>(operation, args)?;
                self.submit_cupping(&CuppingInput {
                    batch_id: batch_id.clone(),
                    trader_id: trader_id.clone(),
                    retailer_id: retailer_id.clone(),
                    date_cupped: date_cupped.clone(),
                    cupper: cupper.clone(),
                    aroma: aroma.clone(),
                    flavor: flavor.clone(),
                    after_taste: after_taste.clone(),
                    acidity: acidity.clone(),
                    body: body.clone(),
                    final_score: final_score.clone(),
                })
                .await?;
                Ok(None)
            }
            "releaseForSale" => {
                let [batch_id, retailer_id] = expect_args::<2>(operation, args)?;
                self.release_for_sale(batch_id, retailer_id).await?;
                Ok(None)
            }
            "pourCup" => {
                let [cup_id] = expect_args::<1>(operation, args)?;
                self.pour_cup(cup_id).await?;
                Ok(None)
            }
            "query" => {
                let [key] = expect_args::<1>(operation, args)?;
                self.query(key).await.map(Some)
            }
            other => Err(LedgerError::UnknownOperation(other.to_string())),
        }
    }
}

fn expect_args<'a, const N: usize>(
    operation: &str,
    args: &'a [String],
) -> Result<&'a [String; N], LedgerError> {
    <&[String; N]>::try_from(args).map_err(|_| {
        LedgerError::validation(
            operation,
            format!("expected {N} arguments, got {}", args.len()),
        )
    })
}
