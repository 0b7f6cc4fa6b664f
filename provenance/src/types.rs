//! Record types stored in the ledger.
//!
//! Records serialize as camelCase JSON with a fixed field set. Unknown fields
//! are rejected on decode, so a key holding one kind of record cannot be read
//! back as another.
//!
//! With the `typescript` feature enabled, these types can be exported to
//! TypeScript using ts-rs for client applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::LedgerError;

#[cfg(feature = "typescript")]
use ts_rs::TS;

// ============================================================================
// Members
// ============================================================================

/// Role a participant plays in the supply chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum MemberType {
    Grower,
    Shipper,
    Trader,
    Retailer,
}

impl MemberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grower => "Grower",
            Self::Shipper => "Shipper",
            Self::Trader => "Trader",
            Self::Retailer => "Retailer",
        }
    }
}

impl std::fmt::Display for MemberType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grower" => Ok(Self::Grower),
            "shipper" => Ok(Self::Shipper),
            "trader" => Ok(Self::Trader),
            "retailer" => Ok(Self::Retailer),
            other => Err(LedgerError::validation(
                "memberType",
                format!("expected grower, shipper, trader or retailer, got '{other}'"),
            )),
        }
    }
}

/// A registered supply-chain participant. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Member {
    pub id: String,
    pub organization: String,
    pub address: String,
    /// Accepted in any case on registration and stored under its canonical
    /// name, so `"grower"` reads back as `"Grower"`.
    pub member_type: MemberType,
}

// ============================================================================
// Coffee batches
// ============================================================================

/// Lifecycle stage of a batch.
///
/// Stages only move forward; see [`crate::batch::BatchEngine`] for the
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchState {
    ReadyForDistribution,
    CertifiedFairTrade,
    Imported,
    WeightVerified,
    Cupped,
    ReadyForSale,
}

impl BatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadyForDistribution => "READY_FOR_DISTRIBUTION",
            Self::CertifiedFairTrade => "CERTIFIED_FAIR_TRADE",
            Self::Imported => "IMPORTED",
            Self::WeightVerified => "WEIGHT_VERIFIED",
            Self::Cupped => "CUPPED",
            Self::ReadyForSale => "READY_FOR_SALE",
        }
    }
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A traceable unit of coffee from one grower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CoffeeBatch {
    /// Assigned once at origination
    pub batch_id: String,
    pub size: String,
    pub roast: String,
    /// Member currently responsible for the batch
    pub owner: String,
    pub batch_state: BatchState,
    pub grower_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipper_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trader_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retailer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fair_trade_report: Option<FairTradeReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packing_list: Option<PackingList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_tally: Option<WeightTally>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cupping: Option<CuppingReport>,
}

/// Fair-trade certification report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FairTradeReport {
    pub report_name: String,
    pub org_description: String,
    pub report_year: u16,
    pub fair_trade_premium_invested: String,
    /// At most three entries
    #[serde(default)]
    pub investments: Vec<PremiumInvestment>,
}

/// One itemized use of the fair-trade premium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PremiumInvestment {
    pub investment_title: String,
    pub investment_amount: String,
}

/// Shipping and customs documentation recorded at import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PackingList {
    pub issue_date: String,
    #[serde(rename = "ICO_Num")]
    pub ico_num: String,
    #[serde(rename = "ICO_Lot")]
    pub ico_lot: String,
    #[serde(rename = "FDA_Num")]
    pub fda_num: String,
    pub invoice_num: String,
    #[serde(rename = "billofLadingNum")]
    pub bill_of_lading_num: String,
    pub vessel_name: String,
    pub vessel_voyage_num: String,
    pub container_num: String,
    pub seal_num: String,
    pub timestamp: String,
}

/// Physical condition of a shipment on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ShipmentCondition {
    Bad,
    Fair,
    Good,
    Excellent,
}

impl FromStr for ShipmentCondition {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bad" => Ok(Self::Bad),
            "fair" => Ok(Self::Fair),
            "good" => Ok(Self::Good),
            "excellent" => Ok(Self::Excellent),
            other => Err(LedgerError::validation(
                "condition",
                format!("expected bad, fair, good or excellent, got '{other}'"),
            )),
        }
    }
}

/// Arrival inspection record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WeightTally {
    pub date_stripped: String,
    pub marks: String,
    pub bags_expected: u32,
    pub condition: ShipmentCondition,
    pub insect_activity: bool,
}

/// Sensory evaluation scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CuppingReport {
    pub date_cupped: String,
    pub cupper: String,
    pub aroma: f64,
    pub flavor: f64,
    pub after_taste: f64,
    pub acidity: f64,
    pub body: f64,
    pub final_score: f64,
}

// ============================================================================
// Pours
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum DrinkType {
    Iced,
    Hot,
    Nitro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum Barista {
    Josh,
    Siv,
}

/// A served cup, keyed by its structured cup id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CupPour {
    pub cup_id: String,
    pub drink_type: DrinkType,
    pub barista: Barista,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bean_type: Option<String>,
    pub last_pour: DateTime<Utc>,
    pub count: u64,
}
