//! Transactions module - raw ledger records, derivation rules, and the store contract.

mod derivation;
mod transactions_constants;
mod transactions_model;
mod transactions_traits;



pub use derivation::{CashDirection, DerivationRules, DerivedFields};
pub use transactions_constants::*;
pub use transactions_model::{NewTransaction, Transaction, TransactionFilter, TransactionType};
pub use transactions_traits::TransactionStore;
