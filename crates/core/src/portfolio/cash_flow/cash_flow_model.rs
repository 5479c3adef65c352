use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::transactions::{Transaction, TransactionType};
use crate::utils::period::Period;

/// Cash moved by one transaction type. Outflows are stored as magnitudes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeFlow {
    pub inflow_usd: Decimal,
    pub outflow_usd: Decimal,
    pub inflow_vnd: Decimal,
    pub outflow_vnd: Decimal,
    pub transaction_count: usize,
}

impl TypeFlow {
    pub fn net_usd(&self) -> Decimal {
        self.inflow_usd - self.outflow_usd
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowReport {
    pub period: Period,
    pub total_in_usd: Decimal,
    pub total_out_usd: Decimal,
    pub net_usd: Decimal,
    pub total_in_vnd: Decimal,
    pub total_out_vnd: Decimal,
    pub net_vnd: Decimal,
    pub by_type: BTreeMap<TransactionType, TypeFlow>,
}

impl CashFlowReport {
    pub fn new(period: Period) -> Self {
        CashFlowReport {
            period,
            total_in_usd: Decimal::ZERO,
            total_out_usd: Decimal::ZERO,
            net_usd: Decimal::ZERO,
            total_in_vnd: Decimal::ZERO,
            total_out_vnd: Decimal::ZERO,
            net_vnd: Decimal::ZERO,
            by_type: BTreeMap::new(),
        }
    }

    pub fn add_transaction(&mut self, tx: &Transaction) {
        let flow = self.by_type.entry(tx.transaction_type).or_default();
        flow.transaction_count += 1;

        if tx.cash_flow_usd > Decimal::ZERO {
            flow.inflow_usd += tx.cash_flow_usd;
            self.total_in_usd += tx.cash_flow_usd;
        } else {
            flow.outflow_usd -= tx.cash_flow_usd;
            self.total_out_usd -= tx.cash_flow_usd;
        }

        if tx.cash_flow_vnd > Decimal::ZERO {
            flow.inflow_vnd += tx.cash_flow_vnd;
            self.total_in_vnd += tx.cash_flow_vnd;
        } else {
            flow.outflow_vnd -= tx.cash_flow_vnd;
            self.total_out_vnd -= tx.cash_flow_vnd;
        }

        self.net_usd = self.total_in_usd - self.total_out_usd;
        self.net_vnd = self.total_in_vnd - self.total_out_vnd;
    }

    pub fn flow_for(&self, transaction_type: TransactionType) -> Option<&TypeFlow> {
        self.by_type.get(&transaction_type)
    }
}
