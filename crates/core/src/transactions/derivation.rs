//! Derivation rules: turn a raw transaction into its signed quantity change and cash flows.
//!
//! Everything here is pure. Deriving the same input twice yields identical fields.

use chrono::{NaiveDate, Utc};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::transactions_model::{NewTransaction, Transaction, TransactionType};
use crate::config::EngineConfig;
use crate::errors::{Result, ValidationError};
use crate::utils::decimal_utils::{checked_difference, checked_product, checked_sum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFields {
    pub delta_qty: Decimal,
    pub cash_flow_usd: Decimal,
    pub cash_flow_vnd: Decimal,
}

/// Which way cash moves for a transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashDirection {
    /// Cash received: `amount - fee`.
    Inflow,
    /// Cash paid: `-(amount + fee)`.
    Outflow,
}

impl CashDirection {
    pub fn of(transaction_type: TransactionType) -> Self {
        match transaction_type {
            TransactionType::Sell
            | TransactionType::Income
            | TransactionType::Interest
            | TransactionType::TransferIn
            | TransactionType::Borrow
            | TransactionType::Unstake => CashDirection::Inflow,
            TransactionType::Buy
            | TransactionType::Expense
            | TransactionType::TransferOut
            | TransactionType::RepayBorrow
            | TransactionType::Stake => CashDirection::Outflow,
        }
    }

    fn apply(&self, amount: Decimal, fee: Decimal) -> Result<Decimal> {
        match self {
            CashDirection::Inflow => checked_difference("cash flow", amount, fee),
            CashDirection::Outflow => checked_sum("cash flow", amount, fee).map(|total| -total),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DerivationRules {
    credit_accounts: HashSet<String>,
}

impl DerivationRules {
    pub fn new<I, S>(credit_accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        DerivationRules {
            credit_accounts: credit_accounts
                .into_iter()
                .map(|a| a.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        DerivationRules {
            credit_accounts: config.credit_account_set(),
        }
    }

    /// Credit-style accounts defer payment: spending on them moves no cash yet.
    pub fn is_credit_account(&self, account: &str) -> bool {
        self.credit_accounts.contains(&account.trim().to_lowercase())
    }

    /// Checks the required fields and returns the validated date and type.
    pub fn validate(&self, tx: &NewTransaction) -> Result<(NaiveDate, TransactionType)> {
        let date = tx
            .date
            .ok_or_else(|| ValidationError::MissingField("date".to_string()))?;
        let transaction_type = tx
            .transaction_type
            .ok_or_else(|| ValidationError::MissingField("type".to_string()))?;

        if tx.asset.trim().is_empty() {
            return Err(ValidationError::MissingField("asset".to_string()).into());
        }
        if tx.account.trim().is_empty() {
            return Err(ValidationError::MissingField("account".to_string()).into());
        }
        if tx.quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(tx.quantity).into());
        }
        if tx.price_local < Decimal::ZERO {
            return Err(ValidationError::NegativePrice(tx.price_local).into());
        }
        for (field, value) in [
            ("fx_to_usd", tx.fx_to_usd),
            ("fx_to_vnd", tx.fx_to_vnd),
            ("fee_usd", tx.fee_usd),
            ("fee_vnd", tx.fee_vnd),
        ] {
            if value < Decimal::ZERO {
                return Err(ValidationError::NegativeAmount {
                    field: field.to_string(),
                    value,
                }
                .into());
            }
        }
        if let Some(apr) = tx.borrow_apr {
            if apr <= Decimal::ZERO {
                return Err(ValidationError::InvalidInput(format!(
                    "borrow_apr must be positive, got {}",
                    apr
                ))
                .into());
            }
        }
        if tx.borrow_term_days == Some(0) {
            return Err(
                ValidationError::InvalidInput("borrow_term_days must be positive".to_string())
                    .into(),
            );
        }

        Ok((date, transaction_type))
    }

    /// Computes `delta_qty` and the USD/VND cash flows for a transaction.
    pub fn derive(&self, tx: &NewTransaction) -> Result<DerivedFields> {
        let (_, transaction_type) = self.validate(tx)?;

        let delta_qty = if transaction_type.increases_holdings() {
            tx.quantity
        } else {
            -tx.quantity
        };

        // Every product a stored record exposes must fit, even on legs that move no cash.
        let amount_local = checked_product("amount", tx.quantity, tx.price_local)?;
        let amount_usd = checked_product("USD amount", amount_local, tx.fx_to_usd)?;
        let amount_vnd = checked_product("VND amount", amount_local, tx.fx_to_vnd)?;
        checked_product("USD price", tx.price_local, tx.fx_to_usd)?;

        if tx.internal_flow {
            return Ok(DerivedFields {
                delta_qty,
                ..Default::default()
            });
        }

        if transaction_type == TransactionType::Expense && self.is_credit_account(&tx.account) {
            debug!(
                "Expense on credit account '{}' defers payment; no cash flow",
                tx.account
            );
            return Ok(DerivedFields {
                delta_qty,
                ..Default::default()
            });
        }

        let direction = CashDirection::of(transaction_type);

        Ok(DerivedFields {
            delta_qty,
            cash_flow_usd: direction.apply(amount_usd, tx.fee_usd)?,
            cash_flow_vnd: direction.apply(amount_vnd, tx.fee_vnd)?,
        })
    }

    /// Validates and derives, producing the stored record.
    pub fn apply(&self, tx: NewTransaction) -> Result<Transaction> {
        let (date, transaction_type) = self.validate(&tx)?;
        let derived = self.derive(&tx)?;

        Ok(Transaction {
            id: tx.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            date,
            transaction_type,
            asset: tx.asset,
            account: tx.account,
            quantity: tx.quantity,
            price_local: tx.price_local,
            local_currency: tx.local_currency,
            fx_to_usd: tx.fx_to_usd,
            fx_to_vnd: tx.fx_to_vnd,
            fee_usd: tx.fee_usd,
            fee_vnd: tx.fee_vnd,
            counterparty: tx.counterparty,
            tag: tx.tag,
            internal_flow: tx.internal_flow,
            borrow_apr: tx.borrow_apr,
            borrow_term_days: tx.borrow_term_days,
            investment_id: tx.investment_id,
            horizon: tx.horizon,
            close_position: tx.close_position,
            delta_qty: derived.delta_qty,
            cash_flow_usd: derived.cash_flow_usd,
            cash_flow_vnd: derived.cash_flow_vnd,
            created_at: Utc::now(),
        })
    }
}
