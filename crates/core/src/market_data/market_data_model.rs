use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Closing price of a symbol in a quote currency on one date.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub symbol: String,
    pub currency: String,
    pub date: NaiveDate,
    pub price: Decimal,
}
