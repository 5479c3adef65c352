//! Tallyfolio Core - ledger derivation and FIFO cost-basis accounting.
//!
//! This crate contains the accounting engine: derivation rules that turn raw
//! transactions into signed quantities and cash flows, the per-position lot
//! ledger, the holdings/spending/cash-flow/borrow aggregators, and the atomic
//! stake/unstake action service. It is storage-agnostic and defines the
//! `TransactionStore` and `AssetPriceSource` traits that storage crates
//! implement.

pub mod config;
pub mod constants;
pub mod errors;
pub mod investments;
pub mod lots;
pub mod market_data;
pub mod portfolio;
pub mod reporting;
pub mod transactions;
pub mod utils;

pub use config::{EngineConfig, ValuationPolicy};
pub use utils::period::Period;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
