/// Canonical transaction type names as stored and exchanged.
pub const TRANSACTION_TYPE_BUY: &str = "buy";
pub const TRANSACTION_TYPE_SELL: &str = "sell";
pub const TRANSACTION_TYPE_EXPENSE: &str = "expense";
pub const TRANSACTION_TYPE_INCOME: &str = "income";
pub const TRANSACTION_TYPE_TRANSFER_IN: &str = "transfer_in";
pub const TRANSACTION_TYPE_TRANSFER_OUT: &str = "transfer_out";
pub const TRANSACTION_TYPE_BORROW: &str = "borrow";
pub const TRANSACTION_TYPE_REPAY_BORROW: &str = "repay_borrow";
pub const TRANSACTION_TYPE_INTEREST: &str = "interest";
pub const TRANSACTION_TYPE_STAKE: &str = "stake";
pub const TRANSACTION_TYPE_UNSTAKE: &str = "unstake";
