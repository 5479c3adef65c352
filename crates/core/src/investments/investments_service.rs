use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, error, info};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::investments_model::{InvestmentActionResult, StakeRequest, UnstakeRequest};
use super::position_locks::PositionLocks;
use crate::config::EngineConfig;
use crate::errors::{Error, LedgerError, Result};
use crate::lots::{LotLedger, PositionKey};
use crate::transactions::{
    DerivationRules, NewTransaction, Transaction, TransactionFilter, TransactionStore,
    TransactionType,
};

const USD: &str = "USD";

#[async_trait]
pub trait InvestmentServiceTrait: Send + Sync {
    async fn stake(&self, request: StakeRequest) -> Result<InvestmentActionResult>;
    async fn unstake(&self, request: UnstakeRequest) -> Result<InvestmentActionResult>;
}

/// Writes paired stake/unstake legs so that the store and the lot ledger never disagree.
///
/// Each action runs under its position's lock:
/// 1. replay the position from the store and apply the action to that ledger
///    (lot errors surface here, before any write);
/// 2. write both legs with a single `create_batch`;
/// 3. replay again from the store and compare with the ledger from step 1.
///
/// If step 3 fails the written legs are deleted again. A failed deletion is
/// reported as `InconsistentAtomicity`.
pub struct InvestmentService {
    transaction_store: Arc<dyn TransactionStore>,
    rules: DerivationRules,
    locks: PositionLocks,
}

struct PositionHistory {
    ledger: LotLedger,
    last_event: Option<NaiveDate>,
}

impl InvestmentService {
    pub fn new(transaction_store: Arc<dyn TransactionStore>, config: &EngineConfig) -> Self {
        InvestmentService {
            transaction_store,
            rules: DerivationRules::from_config(config),
            locks: PositionLocks::new(),
        }
    }

    async fn load_position(&self, key: &PositionKey) -> Result<PositionHistory> {
        let filter = TransactionFilter::all()
            .with_types(&[TransactionType::Stake, TransactionType::Unstake])
            .with_assets(&[key.asset.as_str()])
            .excluding_internal();
        let legs: Vec<Transaction> = self
            .transaction_store
            .query(&filter)
            .await?
            .into_iter()
            .filter(|tx| PositionKey::of(tx) == *key)
            .collect();

        Ok(PositionHistory {
            last_event: legs.iter().map(|tx| tx.date).max(),
            ledger: LotLedger::from_transactions(&legs)?,
        })
    }

    fn ensure_in_order(
        key: &PositionKey,
        date: NaiveDate,
        last_event: Option<NaiveDate>,
    ) -> Result<()> {
        match last_event {
            Some(last) if date < last => Err(LedgerError::InvalidOperation(format!(
                "action on {} dated {} precedes the position's last event on {}",
                key, date, last
            ))
            .into()),
            _ => Ok(()),
        }
    }

    async fn write_legs(
        &self,
        key: &PositionKey,
        investment_id: &str,
        expected: &LotLedger,
        legs: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>> {
        for leg in &legs {
            self.rules.validate(leg)?;
        }

        let leg_count = legs.len();
        let expected_position = expected.position(investment_id);
        let written = self.transaction_store.create_batch(legs).await?;

        let failure = if written.len() != leg_count {
            Error::InconsistentAtomicity(format!(
                "store wrote {} of {} legs for {}",
                written.len(),
                leg_count,
                investment_id
            ))
        } else {
            match self.load_position(key).await {
                Ok(replayed) if replayed.ledger.position(investment_id) == expected_position => {
                    return Ok(written);
                }
                Ok(_) => Error::InconsistentAtomicity(format!(
                    "position {} read back from the store does not match the applied action",
                    investment_id
                )),
                Err(err) => err,
            }
        };

        self.roll_back(&written, failure).await
    }

    async fn roll_back(&self, written: &[Transaction], failure: Error) -> Result<Vec<Transaction>> {
        let ids: Vec<String> = written.iter().map(|tx| tx.id.clone()).collect();
        error!("Rolling back legs {:?}: {}", ids, failure);

        match self.transaction_store.delete_batch(&ids).await {
            Ok(()) => Err(failure),
            Err(rollback_err) => {
                error!("Rollback of {:?} failed: {}", ids, rollback_err);
                Err(Error::InconsistentAtomicity(format!(
                    "{}; rollback of {:?} failed: {}",
                    failure, ids, rollback_err
                )))
            }
        }
    }
}

#[async_trait]
impl InvestmentServiceTrait for InvestmentService {
    async fn stake(&self, request: StakeRequest) -> Result<InvestmentActionResult> {
        debug!(
            "Staking {} {} from {} into {}",
            request.quantity, request.asset, request.source_account, request.investment_account
        );
        request.validate()?;
        let key = request.position_key();
        let _guard = self.locks.acquire(&key).await;

        let PositionHistory { mut ledger, last_event } = self.load_position(&key).await?;
        Self::ensure_in_order(&key, request.date, last_event)?;

        let investment_id = ledger.deposit(
            &key,
            request.investment_id.as_deref(),
            request.date,
            request.quantity,
            request.unit_price_usd,
        )?;

        let stake_leg = NewTransaction::new(
            request.date,
            TransactionType::Stake,
            &request.asset,
            &request.source_account,
            request.quantity,
            request.unit_price_usd,
        )
        .with_currency(USD, Decimal::ONE, request.fx_to_vnd)
        .with_fees(request.fee_usd, request.fee_usd * request.fx_to_vnd)
        .with_counterparty(&request.investment_account)
        .with_investment(&investment_id, &key.horizon);

        let mirror_leg = NewTransaction::new(
            request.date,
            TransactionType::TransferIn,
            &request.asset,
            &request.investment_account,
            request.quantity,
            request.unit_price_usd,
        )
        .with_currency(USD, Decimal::ONE, request.fx_to_vnd)
        .with_counterparty(&request.source_account)
        .with_investment(&investment_id, &key.horizon)
        .internal();

        let transactions = self
            .write_legs(&key, &investment_id, &ledger, vec![stake_leg, mirror_leg])
            .await?;

        info!("Staked {} {} into position {}", request.quantity, request.asset, investment_id);
        Ok(InvestmentActionResult {
            investment_id,
            transactions,
            realized_pnl: None,
        })
    }

    async fn unstake(&self, request: UnstakeRequest) -> Result<InvestmentActionResult> {
        debug!(
            "Unstaking {} {} from {} into {} (close_all: {})",
            request.quantity,
            request.asset,
            request.investment_account,
            request.destination_account,
            request.close_all
        );
        request.validate()?;
        let key = request.position_key();
        let _guard = self.locks.acquire(&key).await;

        let PositionHistory { mut ledger, last_event } = self.load_position(&key).await?;
        Self::ensure_in_order(&key, request.date, last_event)?;

        let investment_id = match request.investment_id.clone() {
            Some(id) => id,
            None => ledger
                .open_position_for(&key)
                .map(|p| p.investment_id.clone())
                .ok_or_else(|| LedgerError::PositionNotFound(key.to_string()))?,
        };

        let entry = ledger.withdraw(
            &investment_id,
            request.date,
            request.quantity,
            request.unit_price_usd,
            request.close_all,
        )?;

        let mut unstake_leg = NewTransaction::new(
            request.date,
            TransactionType::Unstake,
            &request.asset,
            &request.destination_account,
            request.quantity,
            request.unit_price_usd,
        )
        .with_currency(USD, Decimal::ONE, request.fx_to_vnd)
        .with_fees(request.fee_usd, request.fee_usd * request.fx_to_vnd)
        .with_counterparty(&request.investment_account)
        .with_investment(&investment_id, &key.horizon);
        if request.close_all {
            unstake_leg = unstake_leg.closing();
        }

        // The investment account gives up what the lots held, not what was received.
        let mirror_leg = NewTransaction::new(
            request.date,
            TransactionType::TransferOut,
            &request.asset,
            &request.investment_account,
            entry.consumed_quantity,
            request.unit_price_usd,
        )
        .with_currency(USD, Decimal::ONE, request.fx_to_vnd)
        .with_counterparty(&request.destination_account)
        .with_investment(&investment_id, &key.horizon)
        .internal();

        let transactions = self
            .write_legs(&key, &investment_id, &ledger, vec![unstake_leg, mirror_leg])
            .await?;

        info!(
            "Unstaked {} {} from position {}: realized {} USD",
            request.quantity, request.asset, investment_id, entry.realized_pnl_usd
        );
        Ok(InvestmentActionResult {
            investment_id,
            transactions,
            realized_pnl: Some(entry),
        })
    }
}
