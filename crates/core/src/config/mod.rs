//! Engine configuration.

mod config_model;

pub use config_model::{EngineConfig, ValuationPolicy};
