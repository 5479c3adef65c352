use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Expected cash needed to settle one `(account, asset)` borrow at maturity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutflowProjection {
    pub account: String,
    pub asset: String,
    pub remaining_principal: Decimal,
    pub apr: Decimal,
    pub borrow_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub days_remaining: i64,
    pub interest_accrued: Decimal,
    pub total_outflow: Decimal,
}
