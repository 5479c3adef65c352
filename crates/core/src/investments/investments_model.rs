use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_HORIZON;
use crate::errors::{Result, ValidationError};
use crate::lots::{PositionKey, RealizedPnlEntry};
use crate::transactions::Transaction;

/// Move `quantity` of `asset` from a source account into an investment position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRequest {
    pub date: NaiveDate,
    pub asset: String,
    pub source_account: String,
    pub investment_account: String,
    #[serde(default)]
    pub horizon: Option<String>,
    pub quantity: Decimal,
    pub unit_price_usd: Decimal,
    #[serde(default)]
    pub fx_to_vnd: Decimal,
    #[serde(default)]
    pub fee_usd: Decimal,
    /// Continue a known open position; a fresh id is generated when absent.
    #[serde(default)]
    pub investment_id: Option<String>,
}

/// Take `quantity` of `asset` out of an investment position into a destination account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnstakeRequest {
    pub date: NaiveDate,
    pub asset: String,
    pub investment_account: String,
    pub destination_account: String,
    #[serde(default)]
    pub horizon: Option<String>,
    /// Quantity received. With `close_all` this may differ from what the lots hold.
    pub quantity: Decimal,
    pub unit_price_usd: Decimal,
    #[serde(default)]
    pub fx_to_vnd: Decimal,
    #[serde(default)]
    pub fee_usd: Decimal,
    #[serde(default)]
    pub investment_id: Option<String>,
    #[serde(default)]
    pub close_all: bool,
}

fn require_accounts(from: &str, to: &str) -> Result<()> {
    if from.trim().is_empty() || to.trim().is_empty() {
        return Err(ValidationError::MissingField("account".to_string()).into());
    }
    if from.trim().eq_ignore_ascii_case(to.trim()) {
        return Err(ValidationError::InvalidInput(format!(
            "source and investment account must differ, both are '{}'",
            from
        ))
        .into());
    }
    Ok(())
}

impl StakeRequest {
    pub fn position_key(&self) -> PositionKey {
        PositionKey::new(
            &self.asset,
            &self.investment_account,
            self.horizon.as_deref().unwrap_or(DEFAULT_HORIZON),
        )
    }

    pub fn validate(&self) -> Result<()> {
        require_accounts(&self.source_account, &self.investment_account)
    }
}

impl UnstakeRequest {
    pub fn position_key(&self) -> PositionKey {
        PositionKey::new(
            &self.asset,
            &self.investment_account,
            self.horizon.as_deref().unwrap_or(DEFAULT_HORIZON),
        )
    }

    pub fn validate(&self) -> Result<()> {
        require_accounts(&self.investment_account, &self.destination_account)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentActionResult {
    pub investment_id: String,
    /// Both legs as stored: the position leg first, then its internal mirror.
    pub transactions: Vec<Transaction>,
    /// Set for unstakes only.
    pub realized_pnl: Option<RealizedPnlEntry>,
}
