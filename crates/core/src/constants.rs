/// Quote currency every valuation is expressed in unless configured otherwise
pub const DEFAULT_BASE_CURRENCY: &str = "USD";

/// Simple-interest year length
pub const DEFAULT_DAY_COUNT_BASIS: u32 = 365;

/// Number of individual expenses listed in a spending report
pub const DEFAULT_TOP_EXPENSES_LIMIT: usize = 10;

/// Quantity threshold for significant positions
pub const QUANTITY_THRESHOLD: &str = "0.00000001";

/// Group label for expenses without a tag
pub const UNCATEGORIZED_TAG: &str = "Uncategorized";

/// Group label for expenses without a counterparty
pub const UNKNOWN_COUNTERPARTY: &str = "Unknown";

/// Horizon label applied to stake requests that do not name one
pub const DEFAULT_HORIZON: &str = "default";
