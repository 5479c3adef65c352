mod spending_calculator;
mod spending_model;

pub use spending_calculator::{calculate_spending, is_realized_expense};
pub use spending_model::{ExpenseGroup, ExpenseItem, SpendingReport};
