//! Lot ledger - FIFO cost-basis matching for investment positions.

mod lot_ledger;
mod lots_model;


pub use lot_ledger::LotLedger;
pub use lots_model::*;
