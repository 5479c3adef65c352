//! Atomic stake/unstake actions over the transaction store and the lot ledger.

mod investments_model;
mod investments_service;
mod position_locks;


pub use investments_model::{InvestmentActionResult, StakeRequest, UnstakeRequest};
pub use investments_service::{InvestmentService, InvestmentServiceTrait};
pub use position_locks::{PositionLockGuard, PositionLocks};
