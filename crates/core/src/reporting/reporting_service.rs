use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, error};
use std::sync::Arc;

use super::reporting_model::PeriodSummary;
use crate::config::EngineConfig;
use crate::errors::Result;
use crate::lots::{InvestmentPosition, LotLedger, PnLReport};
use crate::market_data::AssetPriceSource;
use crate::portfolio::borrow::{project_borrow_outflows, OutflowProjection};
use crate::portfolio::cash_flow::{calculate_cash_flow, CashFlowReport};
use crate::portfolio::holdings::{
    net_quantities_by_account, net_quantities_by_asset, HoldingsReport, HoldingsValuationService,
    HoldingsValuationServiceTrait, ValuationPoint,
};
use crate::portfolio::spending::{calculate_spending, SpendingReport};
use crate::transactions::{Transaction, TransactionFilter, TransactionStore, TransactionType};
use crate::utils::period::Period;

/// Read-only reports over the transaction store.
///
/// Every report is computed fresh from a store query. Nothing is cached
/// between calls.
#[async_trait]
pub trait ReportingServiceTrait: Send + Sync {
    /// Holdings per `(asset, account)` as of the given date.
    async fn get_holdings(&self, as_of: NaiveDate) -> Result<HoldingsReport>;

    /// Holdings per asset, all accounts combined. Snapshots carry no account.
    async fn get_holdings_by_asset(&self, as_of: NaiveDate) -> Result<HoldingsReport>;

    async fn get_asset_value_history(
        &self,
        asset: &str,
        period: &Period,
    ) -> Result<Vec<ValuationPoint>>;

    async fn get_spending(&self, period: &Period) -> Result<SpendingReport>;

    async fn get_cash_flow(&self, period: &Period) -> Result<CashFlowReport>;

    async fn get_pnl(&self, period: &Period) -> Result<PnLReport>;

    async fn get_investment_pnl(&self, period: &Period, investment_id: &str) -> Result<PnLReport>;

    /// Positions still open at the end of `as_of`.
    async fn get_open_positions(&self, as_of: NaiveDate) -> Result<Vec<InvestmentPosition>>;

    async fn get_expected_borrow_outflows(&self, as_of: NaiveDate)
        -> Result<Vec<OutflowProjection>>;

    async fn get_period_summary(&self, period: &Period) -> Result<PeriodSummary>;
}

pub struct ReportingService {
    transaction_store: Arc<dyn TransactionStore>,
    valuation_service: HoldingsValuationService,
    config: EngineConfig,
}

impl ReportingService {
    pub fn new(
        transaction_store: Arc<dyn TransactionStore>,
        price_source: Arc<dyn AssetPriceSource>,
        config: EngineConfig,
    ) -> Self {
        let valuation_service = HoldingsValuationService::new(
            price_source,
            &config.base_currency,
            config.valuation_policy,
        );
        ReportingService {
            transaction_store,
            valuation_service,
            config,
        }
    }

    async fn load(&self, filter: TransactionFilter) -> Result<Vec<Transaction>> {
        self.transaction_store.query(&filter).await.map_err(|e| {
            error!("Failed to query transactions with {:?}: {}", filter, e);
            e
        })
    }

    async fn replay_ledger(&self, as_of: NaiveDate) -> Result<LotLedger> {
        let legs = self
            .load(
                TransactionFilter::up_to(as_of)
                    .with_types(&[TransactionType::Stake, TransactionType::Unstake])
                    .excluding_internal(),
            )
            .await?;
        LotLedger::from_transactions(&legs)
    }
}

#[async_trait]
impl ReportingServiceTrait for ReportingService {
    async fn get_holdings(&self, as_of: NaiveDate) -> Result<HoldingsReport> {
        debug!("Getting holdings as of {}", as_of);
        let transactions = self.load(TransactionFilter::up_to(as_of)).await?;
        let quantities = net_quantities_by_account(&transactions, as_of);
        self.valuation_service.value_holdings(quantities, as_of).await
    }

    async fn get_holdings_by_asset(&self, as_of: NaiveDate) -> Result<HoldingsReport> {
        debug!("Getting holdings by asset as of {}", as_of);
        let transactions = self.load(TransactionFilter::up_to(as_of)).await?;
        let quantities = net_quantities_by_asset(&transactions, as_of);
        self.valuation_service.value_holdings(quantities, as_of).await
    }

    async fn get_asset_value_history(
        &self,
        asset: &str,
        period: &Period,
    ) -> Result<Vec<ValuationPoint>> {
        debug!("Getting value history for {} over {:?}", asset, period);
        let transactions = self
            .load(TransactionFilter::up_to(period.end_date).with_assets(&[asset]))
            .await?;
        self.valuation_service
            .value_history(asset, &transactions, period)
            .await
    }

    async fn get_spending(&self, period: &Period) -> Result<SpendingReport> {
        debug!("Getting spending for {:?}", period);
        let transactions = self
            .load(TransactionFilter::in_period(period).with_types(&[TransactionType::Expense]))
            .await?;
        Ok(calculate_spending(
            &transactions,
            period,
            self.config.top_expenses_limit,
        ))
    }

    async fn get_cash_flow(&self, period: &Period) -> Result<CashFlowReport> {
        debug!("Getting cash flow for {:?}", period);
        let transactions = self
            .load(TransactionFilter::in_period(period).excluding_internal())
            .await?;
        Ok(calculate_cash_flow(&transactions, period))
    }

    async fn get_pnl(&self, period: &Period) -> Result<PnLReport> {
        debug!("Getting realized PnL for {:?}", period);
        let ledger = self.replay_ledger(period.end_date).await?;
        Ok(ledger.pnl(period))
    }

    async fn get_investment_pnl(&self, period: &Period, investment_id: &str) -> Result<PnLReport> {
        debug!("Getting realized PnL of {} for {:?}", investment_id, period);
        let ledger = self.replay_ledger(period.end_date).await?;
        Ok(ledger.pnl_for_investment(period, investment_id))
    }

    async fn get_open_positions(&self, as_of: NaiveDate) -> Result<Vec<InvestmentPosition>> {
        let ledger = self.replay_ledger(as_of).await?;
        Ok(ledger.open_positions().into_iter().cloned().collect())
    }

    async fn get_expected_borrow_outflows(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<OutflowProjection>> {
        debug!("Projecting borrow outflows as of {}", as_of);
        let transactions = self
            .load(
                TransactionFilter::up_to(as_of)
                    .with_types(&[TransactionType::Borrow, TransactionType::RepayBorrow]),
            )
            .await?;
        Ok(project_borrow_outflows(
            &transactions,
            as_of,
            self.config.day_count_basis,
        ))
    }

    async fn get_period_summary(&self, period: &Period) -> Result<PeriodSummary> {
        debug!("Getting period summary for {:?}", period);
        let transactions = self.load(TransactionFilter::up_to(period.end_date)).await?;
        let ledger = LotLedger::from_transactions(&transactions)?;

        Ok(PeriodSummary {
            period: *period,
            spending: calculate_spending(&transactions, period, self.config.top_expenses_limit),
            cash_flow: calculate_cash_flow(&transactions, period),
            pnl: ledger.pnl(period),
        })
    }
}
