use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

use super::lots_model::{
    CostLot, DepositRecord, InvestmentPosition, PnLReport, PositionKey, RealizedPnlEntry,
};
use crate::errors::{LedgerError, Result, ValidationError};
use crate::transactions::{Transaction, TransactionType};
use crate::utils::decimal_utils::{checked_difference, checked_product, checked_sum};
use crate::utils::period::Period;

/// Per-position FIFO queues of open cost lots plus the realized history.
///
/// A closed position never reopens: the next deposit for the same
/// `(asset, account, horizon)` starts a new position identity.
#[derive(Debug, Clone, Default)]
pub struct LotLedger {
    positions: HashMap<String, InvestmentPosition>,
    open_by_key: HashMap<PositionKey, String>,
    deposits: Vec<DepositRecord>,
    realized: Vec<RealizedPnlEntry>,
    lot_seq: u64,
}

impl LotLedger {
    pub fn new() -> Self {
        LotLedger::default()
    }

    /// Rebuilds the ledger by replaying every stake/unstake leg in date order.
    ///
    /// Legs sharing a date keep their insertion order.
    pub fn from_transactions(transactions: &[Transaction]) -> Result<Self> {
        let mut legs: Vec<&Transaction> = transactions
            .iter()
            .filter(|tx| tx.is_position_leg())
            .collect();
        legs.sort_by_key(|tx| tx.date);

        let mut ledger = LotLedger::new();
        for tx in legs {
            ledger.apply_transaction(tx)?;
        }
        debug!(
            "Replayed lot ledger: {} positions, {} realized entries",
            ledger.positions.len(),
            ledger.realized.len()
        );
        Ok(ledger)
    }

    /// Routes a single stake/unstake leg to `deposit` or `withdraw`.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> Result<Option<RealizedPnlEntry>> {
        let key = PositionKey::of(tx);

        match tx.transaction_type {
            TransactionType::Stake => {
                self.deposit(
                    &key,
                    tx.investment_id.as_deref(),
                    tx.date,
                    tx.quantity,
                    tx.unit_price_usd(),
                )?;
                Ok(None)
            }
            TransactionType::Unstake => {
                let investment_id = match tx.investment_id.as_deref() {
                    Some(id) => id.to_string(),
                    None => self
                        .open_by_key
                        .get(&key)
                        .cloned()
                        .ok_or_else(|| LedgerError::PositionNotFound(key.to_string()))?,
                };
                let entry = self.withdraw(
                    &investment_id,
                    tx.date,
                    tx.quantity,
                    tx.unit_price_usd(),
                    tx.close_position,
                )?;
                Ok(Some(entry))
            }
            other => Err(LedgerError::InvalidOperation(format!(
                "transaction {} of type {} does not touch a lot queue",
                tx.id, other
            ))
            .into()),
        }
    }

    /// Appends a lot to the open position for `key`, opening one if needed.
    ///
    /// Returns the investment id the lot was booked under.
    pub fn deposit(
        &mut self,
        key: &PositionKey,
        investment_id: Option<&str>,
        date: NaiveDate,
        quantity: Decimal,
        unit_cost_usd: Decimal,
    ) -> Result<String> {
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(quantity).into());
        }
        if unit_cost_usd < Decimal::ZERO {
            return Err(ValidationError::NegativePrice(unit_cost_usd).into());
        }

        let cost_usd = checked_product("lot cost", quantity, unit_cost_usd)?;
        let investment_id = self.resolve_deposit_target(key, investment_id, date)?;

        let position = self
            .positions
            .get_mut(&investment_id)
            .ok_or_else(|| LedgerError::PositionNotFound(investment_id.clone()))?;
        // Only an already open position can overflow; a fresh one starts from zero.
        let deposit_qty = checked_sum("deposited quantity", position.deposit_qty, quantity)?;

        self.lot_seq += 1;
        let lot = CostLot {
            id: format!("{}-LOT-{}", investment_id, self.lot_seq),
            quantity_remaining: quantity,
            unit_cost_usd,
            opened_at: date,
        };

        position.lots.push_back(lot);
        position.deposit_qty = deposit_qty;

        self.deposits.push(DepositRecord {
            investment_id: investment_id.clone(),
            date,
            quantity,
            unit_cost_usd,
            cost_usd,
        });

        debug!(
            "Deposited {} @ {} into position {} ({})",
            quantity, unit_cost_usd, investment_id, key
        );
        Ok(investment_id)
    }

    fn resolve_deposit_target(
        &mut self,
        key: &PositionKey,
        investment_id: Option<&str>,
        date: NaiveDate,
    ) -> Result<String> {
        if let Some(open_id) = self.open_by_key.get(key) {
            if let Some(requested) = investment_id {
                if requested != open_id {
                    return Err(LedgerError::InvalidOperation(format!(
                        "position {} is already open under investment {}, not {}",
                        key, open_id, requested
                    ))
                    .into());
                }
            }
            return Ok(open_id.clone());
        }

        let new_id = match investment_id {
            Some(requested) => {
                if self.positions.contains_key(requested) {
                    return Err(LedgerError::PositionClosed(requested.to_string()).into());
                }
                requested.to_string()
            }
            None => Uuid::new_v4().to_string(),
        };

        self.positions.insert(
            new_id.clone(),
            InvestmentPosition::open(new_id.clone(), key.clone(), date),
        );
        self.open_by_key.insert(key.clone(), new_id.clone());
        Ok(new_id)
    }

    /// Consumes lots oldest-first and books the realized PnL on `date`.
    ///
    /// With `close_all` the whole remaining balance is consumed and `quantity`
    /// is the quantity actually received. Nothing is consumed on failure.
    pub fn withdraw(
        &mut self,
        investment_id: &str,
        date: NaiveDate,
        quantity: Decimal,
        unit_price_usd: Decimal,
        close_all: bool,
    ) -> Result<RealizedPnlEntry> {
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(quantity).into());
        }
        if unit_price_usd < Decimal::ZERO {
            return Err(ValidationError::NegativePrice(unit_price_usd).into());
        }

        let position = self
            .positions
            .get_mut(investment_id)
            .filter(|p| p.is_open)
            .ok_or_else(|| LedgerError::PositionNotFound(investment_id.to_string()))?;

        let available = position.remaining_quantity();
        let to_consume = if close_all { available } else { quantity };
        if to_consume > available || available.is_zero() {
            return Err(LedgerError::InsufficientLots {
                investment_id: investment_id.to_string(),
                requested: to_consume,
                available,
            }
            .into());
        }

        let cost_consumed = fifo_cost(&position.lots, to_consume)?;
        let proceeds = checked_product("proceeds", quantity, unit_price_usd)?;
        let realized_pnl_usd = checked_difference("realized PnL", proceeds, cost_consumed)?;

        let mut still_needed = to_consume;
        while still_needed > Decimal::ZERO {
            let Some(lot) = position.lots.front_mut() else {
                break;
            };
            let consumed = lot.quantity_remaining.min(still_needed);
            lot.quantity_remaining -= consumed;
            still_needed -= consumed;
            if lot.quantity_remaining.is_zero() {
                position.lots.pop_front();
            }
        }

        let closed = position.lots.is_empty();
        if closed {
            position.is_open = false;
            position.closed_at = Some(date);
            self.open_by_key.remove(&position.key);
            debug!("Position {} closed on {}", investment_id, date);
        }

        let entry = RealizedPnlEntry {
            investment_id: investment_id.to_string(),
            date,
            quantity,
            consumed_quantity: to_consume,
            unit_price_usd,
            proceeds_usd: proceeds,
            cost_basis_usd: cost_consumed,
            realized_pnl_usd,
            closed_position: closed,
        };
        self.realized.push(entry.clone());
        Ok(entry)
    }

    /// Realized PnL and ROI for withdrawals dated inside `period`.
    pub fn pnl(&self, period: &Period) -> PnLReport {
        self.pnl_matching(period, |_| true)
    }

    pub fn pnl_for_investment(&self, period: &Period, investment_id: &str) -> PnLReport {
        self.pnl_matching(period, |id| id == investment_id)
    }

    fn pnl_matching<F>(&self, period: &Period, include: F) -> PnLReport
    where
        F: Fn(&str) -> bool,
    {
        let entries: Vec<RealizedPnlEntry> = self
            .realized
            .iter()
            .filter(|e| period.contains(e.date) && include(&e.investment_id))
            .cloned()
            .collect();
        let realized_pnl_usd: Decimal = entries.iter().map(|e| e.realized_pnl_usd).sum();

        let deposit_cost_usd: Decimal = self
            .deposits
            .iter()
            .filter(|d| period.contains(d.date) && include(&d.investment_id))
            .map(|d| d.cost_usd)
            .sum();

        let roi_percent = if deposit_cost_usd.is_zero() {
            if !realized_pnl_usd.is_zero() {
                warn!(
                    "Realized PnL {} in {:?} has no in-period deposits; ROI reported as zero",
                    realized_pnl_usd, period
                );
            }
            Decimal::ZERO
        } else {
            realized_pnl_usd / deposit_cost_usd * dec!(100)
        };

        PnLReport {
            period: *period,
            realized_pnl_usd,
            deposit_cost_usd,
            roi_percent,
            entries,
        }
    }

    pub fn position(&self, investment_id: &str) -> Option<&InvestmentPosition> {
        self.positions.get(investment_id)
    }

    pub fn open_position_for(&self, key: &PositionKey) -> Option<&InvestmentPosition> {
        self.open_by_key
            .get(key)
            .and_then(|id| self.positions.get(id))
    }

    /// Open positions ordered by key.
    pub fn open_positions(&self) -> Vec<&InvestmentPosition> {
        let mut open: Vec<&InvestmentPosition> =
            self.positions.values().filter(|p| p.is_open).collect();
        open.sort_by(|a, b| a.key.cmp(&b.key));
        open
    }

    pub fn deposits(&self) -> &[DepositRecord] {
        &self.deposits
    }

    pub fn realized_entries(&self) -> &[RealizedPnlEntry] {
        &self.realized
    }
}

/// Cost of taking `quantity` from the front of `lots`. Nothing is consumed.
fn fifo_cost(lots: &VecDeque<CostLot>, quantity: Decimal) -> Result<Decimal> {
    let mut still_needed = quantity;
    let mut cost = Decimal::ZERO;
    for lot in lots {
        if still_needed <= Decimal::ZERO {
            break;
        }
        let consumed = lot.quantity_remaining.min(still_needed);
        let lot_cost = checked_product("lot cost", consumed, lot.unit_cost_usd)?;
        cost = checked_sum("consumed cost", cost, lot_cost)?;
        still_needed -= consumed;
    }
    Ok(cost)
}
