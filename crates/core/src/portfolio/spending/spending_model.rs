use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{UNCATEGORIZED_TAG, UNKNOWN_COUNTERPARTY};
use crate::transactions::Transaction;
use crate::utils::period::Period;
use crate::utils::time_utils::month_key;

/// Spending under one tag or one counterparty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseGroup {
    pub key: String,
    pub amount_usd: Decimal,
    pub percentage: Decimal,
    pub transaction_count: usize,
}

impl ExpenseGroup {
    fn new(key: &str) -> Self {
        ExpenseGroup {
            key: key.to_string(),
            amount_usd: Decimal::ZERO,
            percentage: Decimal::ZERO,
            transaction_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseItem {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub asset: String,
    pub account: String,
    pub counterparty: Option<String>,
    pub tag: Option<String>,
    /// Gross magnitude, fees excluded.
    pub amount_usd: Decimal,
}

impl From<&Transaction> for ExpenseItem {
    fn from(tx: &Transaction) -> Self {
        ExpenseItem {
            transaction_id: tx.id.clone(),
            date: tx.date,
            asset: tx.asset.clone(),
            account: tx.account.clone(),
            counterparty: tx.counterparty.clone(),
            tag: tx.tag.clone(),
            amount_usd: tx.amount_usd().abs(),
        }
    }
}

/// Realized spending for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingReport {
    pub period: Period,
    pub total_usd: Decimal,
    pub total_vnd: Decimal,
    pub transaction_count: usize,
    pub by_tag: BTreeMap<String, ExpenseGroup>,
    pub by_counterparty: BTreeMap<String, ExpenseGroup>,
    pub by_month: BTreeMap<String, Decimal>,
    pub top_expenses: Vec<ExpenseItem>,
}

impl SpendingReport {
    pub fn new(period: Period) -> Self {
        SpendingReport {
            period,
            total_usd: Decimal::ZERO,
            total_vnd: Decimal::ZERO,
            transaction_count: 0,
            by_tag: BTreeMap::new(),
            by_counterparty: BTreeMap::new(),
            by_month: BTreeMap::new(),
            top_expenses: Vec::new(),
        }
    }

    pub fn add_expense(&mut self, tx: &Transaction) {
        let item = ExpenseItem::from(tx);

        self.total_usd += item.amount_usd;
        self.total_vnd += tx.amount_vnd().abs();
        self.transaction_count += 1;

        *self
            .by_month
            .entry(month_key(tx.date))
            .or_insert(Decimal::ZERO) += item.amount_usd;

        let tag = tx.tag.as_deref().unwrap_or(UNCATEGORIZED_TAG);
        let tag_group = self
            .by_tag
            .entry(tag.to_string())
            .or_insert_with(|| ExpenseGroup::new(tag));
        tag_group.amount_usd += item.amount_usd;
        tag_group.transaction_count += 1;

        let counterparty = tx.counterparty.as_deref().unwrap_or(UNKNOWN_COUNTERPARTY);
        let counterparty_group = self
            .by_counterparty
            .entry(counterparty.to_string())
            .or_insert_with(|| ExpenseGroup::new(counterparty));
        counterparty_group.amount_usd += item.amount_usd;
        counterparty_group.transaction_count += 1;

        self.top_expenses.push(item);
    }

    /// Computes group shares and keeps the `limit` largest expenses.
    ///
    /// Equal amounts keep the order they were added in.
    pub fn finalize(&mut self, limit: usize) {
        let total = self.total_usd;
        for group in self
            .by_tag
            .values_mut()
            .chain(self.by_counterparty.values_mut())
        {
            group.percentage = if total.is_zero() {
                Decimal::ZERO
            } else {
                group.amount_usd / total * dec!(100)
            };
        }

        self.top_expenses.sort_by(|a, b| b.amount_usd.cmp(&a.amount_usd));
        self.top_expenses.truncate(limit);
    }
}
