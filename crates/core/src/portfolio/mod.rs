//! Portfolio aggregations derived from the transaction stream.

pub mod borrow;
pub mod cash_flow;
pub mod holdings;
pub mod spending;
