use log::debug;

use super::spending_model::SpendingReport;
use crate::transactions::{Transaction, TransactionType};
use crate::utils::period::Period;

/// An expense that actually moved cash.
///
/// Internal legs and deferred (zero cash-flow) credit spend are not realized spending.
pub fn is_realized_expense(tx: &Transaction) -> bool {
    tx.is_type(TransactionType::Expense) && !tx.internal_flow && !tx.cash_flow_usd.is_zero()
}

/// Builds the spending report for `period` from already-derived transactions.
///
/// Transactions must be in insertion order; `top_expenses` ties keep that order.
pub fn calculate_spending(
    transactions: &[Transaction],
    period: &Period,
    top_expenses_limit: usize,
) -> SpendingReport {
    let mut report = SpendingReport::new(*period);

    for tx in transactions
        .iter()
        .filter(|tx| period.contains(tx.date) && is_realized_expense(tx))
    {
        report.add_expense(tx);
    }
    report.finalize(top_expenses_limit);

    debug!(
        "Spending {:?}: {} expenses, total {} USD",
        period, report.transaction_count, report.total_usd
    );
    report
}
