use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::constants::{DEFAULT_HORIZON, QUANTITY_THRESHOLD};
use crate::transactions::Transaction;
use crate::utils::period::Period;

pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    let threshold =
        Decimal::from_str_radix(QUANTITY_THRESHOLD, 10).unwrap_or_else(|_| Decimal::new(1, 8));
    quantity.abs() >= threshold
}

/// Identity of an open position. Different horizons are distinct positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionKey {
    pub asset: String,
    pub account: String,
    pub horizon: String,
}

impl PositionKey {
    pub fn new(asset: &str, account: &str, horizon: &str) -> Self {
        PositionKey {
            asset: asset.to_string(),
            account: account.to_string(),
            horizon: horizon.to_string(),
        }
    }

    /// The position a stake/unstake leg feeds.
    pub fn of(tx: &Transaction) -> Self {
        PositionKey::new(
            &tx.asset,
            tx.position_account(),
            tx.horizon.as_deref().unwrap_or(DEFAULT_HORIZON),
        )
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.asset, self.account, self.horizon)
    }
}

/// One FIFO queue entry: quantity still held at a fixed unit cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLot {
    pub id: String,
    pub quantity_remaining: Decimal,
    pub unit_cost_usd: Decimal,
    pub opened_at: NaiveDate,
}

impl CostLot {
    pub fn remaining_cost_usd(&self) -> Decimal {
        self.quantity_remaining * self.unit_cost_usd
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentPosition {
    pub investment_id: String,
    pub key: PositionKey,
    /// Cumulative deposited quantity; never decreases.
    pub deposit_qty: Decimal,
    pub is_open: bool,
    pub opened_at: NaiveDate,
    pub closed_at: Option<NaiveDate>,
    pub lots: VecDeque<CostLot>,
}

impl InvestmentPosition {
    pub(crate) fn open(investment_id: String, key: PositionKey, date: NaiveDate) -> Self {
        InvestmentPosition {
            investment_id,
            key,
            deposit_qty: Decimal::ZERO,
            is_open: true,
            opened_at: date,
            closed_at: None,
            lots: VecDeque::new(),
        }
    }

    pub fn status(&self) -> PositionStatus {
        if self.is_open {
            PositionStatus::Open
        } else {
            PositionStatus::Closed
        }
    }

    pub fn remaining_quantity(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.quantity_remaining).sum()
    }

    /// Cost basis of the lots still held.
    pub fn remaining_cost_usd(&self) -> Decimal {
        self.lots.iter().map(CostLot::remaining_cost_usd).sum()
    }

    pub fn average_cost_usd(&self) -> Decimal {
        let quantity = self.remaining_quantity();
        if quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.remaining_cost_usd() / quantity
        }
    }
}

/// Capital committed to a position on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRecord {
    pub investment_id: String,
    pub date: NaiveDate,
    pub quantity: Decimal,
    pub unit_cost_usd: Decimal,
    pub cost_usd: Decimal,
}

/// Realized result of one withdrawal, attributed to the withdrawal date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizedPnlEntry {
    pub investment_id: String,
    pub date: NaiveDate,
    /// Quantity received.
    pub quantity: Decimal,
    /// Lot quantity consumed to fund it.
    pub consumed_quantity: Decimal,
    pub unit_price_usd: Decimal,
    pub proceeds_usd: Decimal,
    pub cost_basis_usd: Decimal,
    pub realized_pnl_usd: Decimal,
    pub closed_position: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnLReport {
    pub period: Period,
    pub realized_pnl_usd: Decimal,
    /// ROI denominator: deposits dated inside the period only.
    pub deposit_cost_usd: Decimal,
    pub roi_percent: Decimal,
    pub entries: Vec<RealizedPnlEntry>,
}
