//! Holdings - net quantities as of a date, valued through the price source.

mod holdings_calculator;
mod holdings_model;
mod holdings_valuation_service;


pub use holdings_calculator::{
    assign_percentages, net_quantities_by_account, net_quantities_by_asset, HoldingKey,
};
pub use holdings_model::*;
pub use holdings_valuation_service::{HoldingsValuationService, HoldingsValuationServiceTrait};
