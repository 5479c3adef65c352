use log::debug;

use super::cash_flow_model::CashFlowReport;
use crate::transactions::Transaction;
use crate::utils::period::Period;

/// Sums the derived cash flows of every non-internal transaction in `period`.
pub fn calculate_cash_flow(transactions: &[Transaction], period: &Period) -> CashFlowReport {
    let mut report = CashFlowReport::new(*period);
    for tx in transactions
        .iter()
        .filter(|tx| period.contains(tx.date) && !tx.internal_flow)
    {
        report.add_transaction(tx);
    }
    debug!(
        "Cash flow {:?}: in {} / out {} USD across {} types",
        period,
        report.total_in_usd,
        report.total_out_usd,
        report.by_type.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::{DerivationRules, NewTransaction, TransactionType};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn derive(tx: NewTransaction) -> Transaction {
        DerivationRules::new(["Amex"]).apply(tx).unwrap()
    }

    fn usd(day: u32, t: TransactionType, account: &str, amount: Decimal) -> NewTransaction {
        NewTransaction::new(d(day), t, "USD", account, amount, dec!(1))
            .with_currency("USD", dec!(1), dec!(25000))
    }

    fn period() -> Period {
        Period::month(2024, 5).unwrap()
    }

    #[test]
    fn test_splits_inflows_and_outflows_by_type() {
        let transactions = vec![
            derive(usd(1, TransactionType::Income, "Checking", dec!(3000))),
            derive(
                usd(2, TransactionType::Expense, "Checking", dec!(120))
                    .with_fees(dec!(1), dec!(25000)),
            ),
            derive(usd(3, TransactionType::Interest, "Savings", dec!(4.5))),
            derive(usd(4, TransactionType::Borrow, "Loan", dec!(500))),
            derive(usd(5, TransactionType::RepayBorrow, "Loan", dec!(100))),
        ];

        let report = calculate_cash_flow(&transactions, &period());

        assert_eq!(report.total_in_usd, dec!(3504.5));
        assert_eq!(report.total_out_usd, dec!(221));
        assert_eq!(report.net_usd, dec!(3283.5));

        let expense = report.flow_for(TransactionType::Expense).unwrap();
        assert_eq!(expense.outflow_usd, dec!(121));
        assert_eq!(expense.outflow_vnd, dec!(3025000));
        assert!(expense.inflow_usd.is_zero());

        let interest = report.flow_for(TransactionType::Interest).unwrap();
        assert_eq!(interest.inflow_usd, dec!(4.5));
        assert_eq!(interest.transaction_count, 1);
    }

    #[test]
    fn test_excludes_internal_legs_and_out_of_period() {
        let transactions = vec![
            derive(usd(1, TransactionType::TransferOut, "Checking", dec!(200)).internal()),
            derive(usd(1, TransactionType::TransferIn, "Brokerage", dec!(200)).internal()),
            derive(
                NewTransaction::new(
                    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                    TransactionType::Income,
                    "USD",
                    "Checking",
                    dec!(10),
                    dec!(1),
                ),
            ),
        ];

        let report = calculate_cash_flow(&transactions, &period());

        assert!(report.by_type.is_empty());
        assert!(report.net_usd.is_zero());
    }

    #[test]
    fn test_credit_expense_counted_with_zero_flow() {
        let transactions = vec![derive(usd(9, TransactionType::Expense, "Amex", dec!(30)))];

        let report = calculate_cash_flow(&transactions, &period());

        assert_eq!(report.flow_for(TransactionType::Expense).unwrap().transaction_count, 1);
        assert!(report.total_out_usd.is_zero());
    }
}
