use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use futures::StreamExt;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use super::holdings_calculator::{assign_percentages, HoldingKey};
use super::holdings_model::{HoldingsReport, HoldingsSnapshot, UnpricedHolding, ValuationPoint};
use crate::config::ValuationPolicy;
use crate::errors::{Error, Result};
use crate::market_data::AssetPriceSource;
use crate::transactions::Transaction;
use crate::utils::period::Period;

#[async_trait]
pub trait HoldingsValuationServiceTrait: Send + Sync {
    /// Prices each net quantity at `as_of` and computes portfolio shares.
    async fn value_holdings(
        &self,
        quantities: BTreeMap<HoldingKey, Decimal>,
        as_of: NaiveDate,
    ) -> Result<HoldingsReport>;

    /// Values one asset's net holding on every date the price source knows within `period`.
    async fn value_history(
        &self,
        asset: &str,
        transactions: &[Transaction],
        period: &Period,
    ) -> Result<Vec<ValuationPoint>>;
}

#[derive(Clone)]
pub struct HoldingsValuationService {
    price_source: Arc<dyn AssetPriceSource>,
    base_currency: String,
    policy: ValuationPolicy,
}

impl HoldingsValuationService {
    pub fn new(
        price_source: Arc<dyn AssetPriceSource>,
        base_currency: &str,
        policy: ValuationPolicy,
    ) -> Self {
        Self {
            price_source,
            base_currency: base_currency.to_string(),
            policy,
        }
    }

    async fn price_for(&self, asset: &str, as_of: NaiveDate) -> Result<Decimal> {
        if asset.eq_ignore_ascii_case(&self.base_currency) {
            return Ok(Decimal::ONE);
        }
        self.price_source
            .price_on(asset, &self.base_currency, as_of)
            .await
    }

    /// Fetches one price per distinct asset.
    ///
    /// In strict mode the first failure is returned; in partial mode only
    /// `PriceUnavailable` is tolerated and recorded per asset.
    async fn fetch_prices(
        &self,
        assets: BTreeSet<String>,
        as_of: NaiveDate,
    ) -> Result<(HashMap<String, Decimal>, HashMap<String, String>)> {
        let lookups = join_all(assets.iter().map(|asset| self.price_for(asset, as_of))).await;

        let mut prices = HashMap::new();
        let mut failures = HashMap::new();
        for (asset, lookup) in assets.into_iter().zip(lookups) {
            match lookup {
                Ok(price) => {
                    prices.insert(asset, price);
                }
                Err(err @ Error::PriceUnavailable { .. })
                    if self.policy == ValuationPolicy::Partial =>
                {
                    warn!("Leaving {} unpriced on {}: {}", asset, as_of, err);
                    failures.insert(asset, err.to_string());
                }
                Err(err) => return Err(err),
            }
        }
        Ok((prices, failures))
    }
}

#[async_trait]
impl HoldingsValuationServiceTrait for HoldingsValuationService {
    async fn value_holdings(
        &self,
        quantities: BTreeMap<HoldingKey, Decimal>,
        as_of: NaiveDate,
    ) -> Result<HoldingsReport> {
        let assets: BTreeSet<String> = quantities.keys().map(|(asset, _)| asset.clone()).collect();
        debug!(
            "Valuing {} holdings across {} assets as of {}",
            quantities.len(),
            assets.len(),
            as_of
        );

        let (prices, failures) = self.fetch_prices(assets, as_of).await?;

        let mut holdings = Vec::new();
        let mut unpriced = Vec::new();
        for ((asset, account), quantity) in quantities {
            match prices.get(&asset) {
                Some(price) => holdings.push(HoldingsSnapshot {
                    value_usd: quantity * *price,
                    price: *price,
                    asset,
                    account,
                    quantity,
                    percentage: Decimal::ZERO,
                    as_of,
                }),
                None => {
                    let reason = failures
                        .get(&asset)
                        .cloned()
                        .unwrap_or_else(|| "price unavailable".to_string());
                    unpriced.push(UnpricedHolding {
                        asset,
                        account,
                        quantity,
                        reason,
                    });
                }
            }
        }

        let total_value_usd = assign_percentages(&mut holdings);

        Ok(HoldingsReport {
            as_of,
            base_currency: self.base_currency.clone(),
            total_value_usd,
            holdings,
            unpriced,
        })
    }

    async fn value_history(
        &self,
        asset: &str,
        transactions: &[Transaction],
        period: &Period,
    ) -> Result<Vec<ValuationPoint>> {
        let asset_transactions: Vec<&Transaction> =
            transactions.iter().filter(|tx| tx.asset == asset).collect();

        let mut stream = self.price_source.price_range(
            asset,
            &self.base_currency,
            period.start_date,
            period.end_date,
        );

        let mut points = Vec::new();
        while let Some(point) = stream.next().await {
            let point = point?;
            let quantity: Decimal = asset_transactions
                .iter()
                .filter(|tx| tx.date <= point.date)
                .map(|tx| tx.delta_qty)
                .sum();
            points.push(ValuationPoint {
                asset: asset.to_string(),
                date: point.date,
                quantity,
                price: point.price,
                value_usd: quantity * point.price,
            });
        }
        Ok(points)
    }
}
