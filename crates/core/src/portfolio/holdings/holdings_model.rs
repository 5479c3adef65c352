use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point-in-time holding with its share of the priced portfolio.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsSnapshot {
    pub asset: String,
    /// `None` on the per-asset view, where accounts are folded together.
    pub account: Option<String>,
    pub quantity: Decimal,
    pub price: Decimal,
    pub value_usd: Decimal,
    pub percentage: Decimal,
    pub as_of: NaiveDate,
}

/// A holding whose valuation failed. It is never valued at zero.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnpricedHolding {
    pub asset: String,
    pub account: Option<String>,
    pub quantity: Decimal,
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsReport {
    pub as_of: NaiveDate,
    pub base_currency: String,
    pub total_value_usd: Decimal,
    pub holdings: Vec<HoldingsSnapshot>,
    pub unpriced: Vec<UnpricedHolding>,
}

impl HoldingsReport {
    pub fn is_complete(&self) -> bool {
        self.unpriced.is_empty()
    }

    pub fn find(&self, asset: &str, account: Option<&str>) -> Option<&HoldingsSnapshot> {
        self.holdings
            .iter()
            .find(|h| h.asset == asset && h.account.as_deref() == account)
    }

    /// Keyed by asset; meant for the per-asset view.
    pub fn into_asset_map(self) -> BTreeMap<String, HoldingsSnapshot> {
        self.holdings
            .into_iter()
            .map(|h| (h.asset.clone(), h))
            .collect()
    }
}

/// Value of one asset's net holding on a date with a known price.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValuationPoint {
    pub asset: String,
    pub date: NaiveDate,
    pub quantity: Decimal,
    pub price: Decimal,
    pub value_usd: Decimal,
}
