use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, BoxStream, StreamExt};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tallyfolio_core::errors::{Error, Result};
use tallyfolio_core::market_data::{AssetPriceSource, PricePoint};

use crate::errors::StorageError;

type QuoteSeries = BTreeMap<NaiveDate, Decimal>;

/// Quote table keyed by `(symbol, currency)`.
///
/// `price_on` resolves to the latest quote on or before the requested date.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    quotes: HashMap<(String, String), QuoteSeries>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = PricePoint>) -> Self {
        let mut source = Self::new();
        for point in points {
            source.insert(point);
        }
        source
    }

    /// Loads a JSON array of price points (`symbol`, `currency`, `date`, `price`).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let points: Vec<PricePoint> = serde_json::from_str(json).map_err(StorageError::from)?;
        debug!("Loaded {} price points", points.len());
        Ok(Self::from_points(points))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StorageError::QuoteFile(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&contents)
    }

    /// Adds or replaces the quote for the point's date.
    pub fn insert(&mut self, point: PricePoint) {
        self.quotes
            .entry((point.symbol, point.currency))
            .or_default()
            .insert(point.date, point.price);
    }

    pub fn with_quote(
        mut self,
        symbol: &str,
        currency: &str,
        date: NaiveDate,
        price: Decimal,
    ) -> Self {
        self.insert(PricePoint {
            symbol: symbol.to_string(),
            currency: currency.to_string(),
            date,
            price,
        });
        self
    }

    fn series(&self, symbol: &str, currency: &str) -> Option<&QuoteSeries> {
        self.quotes.get(&(symbol.to_string(), currency.to_string()))
    }
}

#[async_trait]
impl AssetPriceSource for InMemoryPriceSource {
    async fn price_on(&self, symbol: &str, currency: &str, date: NaiveDate) -> Result<Decimal> {
        let quote = self
            .series(symbol, currency)
            .and_then(|series| series.range(..=date).next_back());

        match quote {
            Some((quote_date, price)) => {
                if *quote_date != date {
                    debug!("Using {} quote from {} for {}", symbol, quote_date, date);
                }
                Ok(*price)
            }
            None => {
                warn!("No {} quote in {} on or before {}", symbol, currency, date);
                Err(Error::PriceUnavailable {
                    symbol: symbol.to_string(),
                    currency: currency.to_string(),
                    date,
                })
            }
        }
    }

    fn price_range<'a>(
        &'a self,
        symbol: &'a str,
        currency: &'a str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxStream<'a, Result<PricePoint>> {
        let Some(series) = self.series(symbol, currency).filter(|_| start <= end) else {
            return stream::empty().boxed();
        };
        stream::iter(series.range(start..=end).map(move |(date, price)| {
            Ok(PricePoint {
                symbol: symbol.to_string(),
                currency: currency.to_string(),
                date: *date,
                price: *price,
            })
        }))
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn source() -> InMemoryPriceSource {
        InMemoryPriceSource::new()
            .with_quote("BTC", "USD", d(1, 1), dec!(42000))
            .with_quote("BTC", "USD", d(1, 5), dec!(45000))
            .with_quote("BTC", "USD", d(2, 1), dec!(43000))
    }

    #[tokio::test]
    async fn test_price_on_uses_nearest_earlier_quote() {
        let source = source();
        assert_eq!(source.price_on("BTC", "USD", d(1, 5)).await.unwrap(), dec!(45000));
        assert_eq!(source.price_on("BTC", "USD", d(1, 20)).await.unwrap(), dec!(45000));
    }

    #[tokio::test]
    async fn test_price_before_first_quote_is_unavailable() {
        let source = source();
        let err = source.price_on("BTC", "USD", d(1, 1).pred_opt().unwrap()).await;
        assert!(matches!(err, Err(Error::PriceUnavailable { .. })));
        assert!(source.price_on("BTC", "EUR", d(3, 1)).await.is_err());
    }

    #[tokio::test]
    async fn test_price_range_is_ordered_and_bounded() {
        let source = source();
        let points: Vec<PricePoint> = source
            .price_range("BTC", "USD", d(1, 2), d(2, 1))
            .map(|p| p.unwrap())
            .collect()
            .await;

        let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(1, 5), d(2, 1)]);

        let empty: Vec<_> = source
            .price_range("BTC", "USD", d(3, 1), d(2, 1))
            .collect()
            .await;
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_loads_quotes_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quotes.json");
        std::fs::write(
            &path,
            r#"[{"symbol":"ETH","currency":"USD","date":"2024-03-01","price":3400.5}]"#,
        )
        .unwrap();

        let source = InMemoryPriceSource::from_file(&path).unwrap();
        assert_eq!(source.price_on("ETH", "USD", d(3, 2)).await.unwrap(), dec!(3400.5));

        assert!(matches!(
            InMemoryPriceSource::from_file(dir.path().join("missing.json")),
            Err(Error::ConfigIO(_))
        ));
    }
}
