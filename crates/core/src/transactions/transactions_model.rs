//! Transaction domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::transactions_constants::*;
use crate::errors::{Error, ValidationError};
use crate::utils::period::Period;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Buy,
    Sell,
    Expense,
    Income,
    TransferIn,
    TransferOut,
    Borrow,
    RepayBorrow,
    Interest,
    Stake,
    Unstake,
}

impl TransactionType {
    pub const ALL: [TransactionType; 11] = [
        TransactionType::Buy,
        TransactionType::Sell,
        TransactionType::Expense,
        TransactionType::Income,
        TransactionType::TransferIn,
        TransactionType::TransferOut,
        TransactionType::Borrow,
        TransactionType::RepayBorrow,
        TransactionType::Interest,
        TransactionType::Stake,
        TransactionType::Unstake,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => TRANSACTION_TYPE_BUY,
            TransactionType::Sell => TRANSACTION_TYPE_SELL,
            TransactionType::Expense => TRANSACTION_TYPE_EXPENSE,
            TransactionType::Income => TRANSACTION_TYPE_INCOME,
            TransactionType::TransferIn => TRANSACTION_TYPE_TRANSFER_IN,
            TransactionType::TransferOut => TRANSACTION_TYPE_TRANSFER_OUT,
            TransactionType::Borrow => TRANSACTION_TYPE_BORROW,
            TransactionType::RepayBorrow => TRANSACTION_TYPE_REPAY_BORROW,
            TransactionType::Interest => TRANSACTION_TYPE_INTEREST,
            TransactionType::Stake => TRANSACTION_TYPE_STAKE,
            TransactionType::Unstake => TRANSACTION_TYPE_UNSTAKE,
        }
    }

    /// Types whose quantity is added to the holding account.
    pub fn increases_holdings(&self) -> bool {
        matches!(
            self,
            TransactionType::Buy
                | TransactionType::TransferIn
                | TransactionType::Income
                | TransactionType::Interest
                | TransactionType::Borrow
                | TransactionType::Unstake
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        TransactionType::ALL
            .iter()
            .find(|t| t.as_str() == normalized)
            .copied()
            .ok_or_else(|| {
                ValidationError::InvalidInput(format!("Unknown transaction type: {}", s)).into()
            })
    }
}

/// Unvalidated transaction input as handed to a transaction store.
///
/// `date` and `transaction_type` are optional here so that their absence is
/// reported as a validation failure instead of being defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub id: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub asset: String,
    pub account: String,
    pub quantity: Decimal,
    pub price_local: Decimal,
    pub local_currency: String,
    pub fx_to_usd: Decimal,
    #[serde(default)]
    pub fx_to_vnd: Decimal,
    #[serde(default)]
    pub fee_usd: Decimal,
    #[serde(default)]
    pub fee_vnd: Decimal,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub internal_flow: bool,
    #[serde(default)]
    pub borrow_apr: Option<Decimal>,
    #[serde(default)]
    pub borrow_term_days: Option<u32>,
    #[serde(default)]
    pub investment_id: Option<String>,
    #[serde(default)]
    pub horizon: Option<String>,
    /// On an unstake leg: drain the whole position regardless of `quantity`.
    #[serde(default)]
    pub close_position: bool,
}

impl NewTransaction {
    /// A USD-denominated transaction with no fees; refine with the `with_*` helpers.
    pub fn new(
        date: NaiveDate,
        transaction_type: TransactionType,
        asset: &str,
        account: &str,
        quantity: Decimal,
        price_local: Decimal,
    ) -> Self {
        NewTransaction {
            id: None,
            date: Some(date),
            transaction_type: Some(transaction_type),
            asset: asset.to_string(),
            account: account.to_string(),
            quantity,
            price_local,
            local_currency: "USD".to_string(),
            fx_to_usd: Decimal::ONE,
            fx_to_vnd: Decimal::ZERO,
            fee_usd: Decimal::ZERO,
            fee_vnd: Decimal::ZERO,
            counterparty: None,
            tag: None,
            internal_flow: false,
            borrow_apr: None,
            borrow_term_days: None,
            investment_id: None,
            horizon: None,
            close_position: false,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_currency(
        mut self,
        local_currency: &str,
        fx_to_usd: Decimal,
        fx_to_vnd: Decimal,
    ) -> Self {
        self.local_currency = local_currency.to_string();
        self.fx_to_usd = fx_to_usd;
        self.fx_to_vnd = fx_to_vnd;
        self
    }

    pub fn with_fees(mut self, fee_usd: Decimal, fee_vnd: Decimal) -> Self {
        self.fee_usd = fee_usd;
        self.fee_vnd = fee_vnd;
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_counterparty(mut self, counterparty: &str) -> Self {
        self.counterparty = Some(counterparty.to_string());
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal_flow = true;
        self
    }

    pub fn with_borrow_terms(mut self, apr: Decimal, term_days: u32) -> Self {
        self.borrow_apr = Some(apr);
        self.borrow_term_days = Some(term_days);
        self
    }

    pub fn with_investment(mut self, investment_id: &str, horizon: &str) -> Self {
        self.investment_id = Some(investment_id.to_string());
        self.horizon = Some(horizon.to_string());
        self
    }

    pub fn closing(mut self) -> Self {
        self.close_position = true;
        self
    }
}

/// A validated ledger event with its derived accounting fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub asset: String,
    pub account: String,
    pub quantity: Decimal,
    pub price_local: Decimal,
    pub local_currency: String,
    pub fx_to_usd: Decimal,
    pub fx_to_vnd: Decimal,
    pub fee_usd: Decimal,
    pub fee_vnd: Decimal,
    pub counterparty: Option<String>,
    pub tag: Option<String>,
    pub internal_flow: bool,
    pub borrow_apr: Option<Decimal>,
    pub borrow_term_days: Option<u32>,
    pub investment_id: Option<String>,
    pub horizon: Option<String>,
    pub close_position: bool,

    // Derived
    pub delta_qty: Decimal,
    pub cash_flow_usd: Decimal,
    pub cash_flow_vnd: Decimal,

    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Gross value in the local currency, fees excluded.
    pub fn amount_local(&self) -> Decimal {
        self.quantity * self.price_local
    }

    pub fn amount_usd(&self) -> Decimal {
        self.amount_local() * self.fx_to_usd
    }

    pub fn amount_vnd(&self) -> Decimal {
        self.amount_local() * self.fx_to_vnd
    }

    pub fn unit_price_usd(&self) -> Decimal {
        self.price_local * self.fx_to_usd
    }

    /// The account whose lot queue a stake/unstake leg feeds.
    pub fn position_account(&self) -> &str {
        self.counterparty.as_deref().unwrap_or(&self.account)
    }

    pub fn is_type(&self, transaction_type: TransactionType) -> bool {
        self.transaction_type == transaction_type
    }

    /// Legs that move value into or out of an investment position.
    pub fn is_position_leg(&self) -> bool {
        !self.internal_flow
            && matches!(
                self.transaction_type,
                TransactionType::Stake | TransactionType::Unstake
            )
    }
}

/// Predicate over stored transactions. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub types: Option<Vec<TransactionType>>,
    pub accounts: Option<Vec<String>>,
    pub assets: Option<Vec<String>>,
    pub investment_id: Option<String>,
    /// Internal-flow legs are returned unless this is explicitly `false`.
    pub include_internal: Option<bool>,
}

impl TransactionFilter {
    pub fn all() -> Self {
        TransactionFilter::default()
    }

    pub fn in_period(period: &Period) -> Self {
        TransactionFilter {
            start_date: Some(period.start_date),
            end_date: Some(period.end_date),
            ..Default::default()
        }
    }

    pub fn up_to(as_of: NaiveDate) -> Self {
        TransactionFilter {
            end_date: Some(as_of),
            ..Default::default()
        }
    }

    pub fn with_types(mut self, types: &[TransactionType]) -> Self {
        self.types = Some(types.to_vec());
        self
    }

    pub fn with_accounts(mut self, accounts: &[&str]) -> Self {
        self.accounts = Some(accounts.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn with_assets(mut self, assets: &[&str]) -> Self {
        self.assets = Some(assets.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn for_investment(mut self, investment_id: &str) -> Self {
        self.investment_id = Some(investment_id.to_string());
        self
    }

    pub fn excluding_internal(mut self) -> Self {
        self.include_internal = Some(false);
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if self.start_date.is_some_and(|start| tx.date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| tx.date > end) {
            return false;
        }
        if let Some(types) = &self.types {
            if !types.contains(&tx.transaction_type) {
                return false;
            }
        }
        if let Some(accounts) = &self.accounts {
            if !accounts.iter().any(|a| a == &tx.account) {
                return false;
            }
        }
        if let Some(assets) = &self.assets {
            if !assets.iter().any(|a| a == &tx.asset) {
                return false;
            }
        }
        if let Some(investment_id) = &self.investment_id {
            if tx.investment_id.as_deref() != Some(investment_id.as_str()) {
                return false;
            }
        }
        if self.include_internal == Some(false) && tx.internal_flow {
            return false;
        }
        true
    }
}
