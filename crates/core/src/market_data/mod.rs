//! Market data module - the price source contract the holdings aggregator consumes.

mod market_data_model;
mod market_data_traits;

pub use market_data_model::PricePoint;
pub use market_data_traits::AssetPriceSource;
