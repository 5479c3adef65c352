use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::BoxStream;
use rust_decimal::Decimal;

use super::market_data_model::PricePoint;
use crate::errors::Result;

/// External price feed. The nearest-available-date policy belongs to the implementation.
#[async_trait]
pub trait AssetPriceSource: Send + Sync {
    /// Point-in-time price, or `Error::PriceUnavailable` when none can be resolved.
    async fn price_on(&self, symbol: &str, currency: &str, date: NaiveDate) -> Result<Decimal>;

    /// Lazily yields the known prices between `start` and `end` inclusive.
    fn price_range<'a>(
        &'a self,
        symbol: &'a str,
        currency: &'a str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxStream<'a, Result<PricePoint>>;
}
