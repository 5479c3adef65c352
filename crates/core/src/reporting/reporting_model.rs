use serde::{Deserialize, Serialize};

use crate::lots::PnLReport;
use crate::portfolio::cash_flow::CashFlowReport;
use crate::portfolio::spending::SpendingReport;
use crate::utils::period::Period;

/// Spending, cash flow and realized PnL computed from one read of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub period: Period,
    pub spending: SpendingReport,
    pub cash_flow: CashFlowReport,
    pub pnl: PnLReport,
}
