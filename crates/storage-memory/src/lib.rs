//! In-process storage implementation for Tallyfolio.
//!
//! Implements the collaborator traits defined in `tallyfolio-core`:
//! - `InMemoryTransactionStore`: an append-only, validating transaction store
//!   with all-or-nothing batch writes
//! - `InMemoryPriceSource`: a quote table resolving prices with a
//!   nearest-earlier-date policy
//!
//! ```text
//!   core (engine, traits)
//!          │
//!          ▼
//!   storage-memory (this crate)
//! ```

pub mod errors;
pub mod market_data;
pub mod transactions;

pub use errors::StorageError;
pub use market_data::InMemoryPriceSource;
pub use transactions::InMemoryTransactionStore;

// Re-export from tallyfolio-core for convenience
pub use tallyfolio_core::errors::{Error, Result};
