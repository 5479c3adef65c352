//! Core error types for the Tallyfolio engine.
//!
//! This module defines storage-agnostic error types. Collaborator implementations
//! (transaction stores, price sources) convert their own failures into these types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Lot ledger operation failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("No price available for {symbol} in {currency} on {date}")]
    PriceUnavailable {
        symbol: String,
        currency: String,
        date: NaiveDate,
    },

    /// A paired write could not complete as a unit.
    #[error("Paired write could not complete atomically: {0}")]
    InconsistentAtomicity(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Failed to load configuration: {0}")]
    ConfigIO(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),
}

/// Errors raised by the lot ledger while matching deposits and withdrawals.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient lots in {investment_id}: requested {requested}, available {available}")]
    InsufficientLots {
        investment_id: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Investment position not found: {0}")]
    PositionNotFound(String),

    #[error("Investment position {0} is closed")]
    PositionClosed(String),

    #[error("Invalid ledger operation: {0}")]
    InvalidOperation(String),
}

/// Validation errors for transaction input and report parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    #[error("Price must not be negative, got {0}")]
    NegativePrice(Decimal),

    #[error("Field '{field}' must not be negative, got {value}")]
    NegativeAmount { field: String, value: Decimal },

    #[error("Invalid period: start {start} is after end {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },
}

impl Error {
    /// True for failures that were rejected before any state change.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfigValue(err.to_string())
    }
}
