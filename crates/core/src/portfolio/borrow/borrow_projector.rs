//! Simple-interest projection of open borrow balances.

use chrono::NaiveDate;
use log::{debug, warn};
use num_traits::Zero;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::borrow_model::OutflowProjection;
use crate::lots::is_quantity_significant;
use crate::transactions::{Transaction, TransactionType};
use crate::utils::time_utils::{add_days, days_until};

#[derive(Default)]
struct BorrowBalance<'a> {
    principal: Decimal,
    terms_from: Option<&'a Transaction>,
}

/// One projection per `(account, asset)` with an outstanding borrow at `as_of`.
///
/// Terms come from the most recent borrow carrying both an APR and a term.
/// Balances without terms carry no projectable interest and are skipped.
pub fn project_borrow_outflows(
    transactions: &[Transaction],
    as_of: NaiveDate,
    day_count_basis: u32,
) -> Vec<OutflowProjection> {
    let mut balances: BTreeMap<(String, String), BorrowBalance> = BTreeMap::new();

    for tx in transactions.iter().filter(|tx| {
        tx.date <= as_of
            && matches!(
                tx.transaction_type,
                TransactionType::Borrow | TransactionType::RepayBorrow
            )
    }) {
        let balance = balances
            .entry((tx.account.clone(), tx.asset.clone()))
            .or_default();
        balance.principal += tx.delta_qty;

        if tx.is_type(TransactionType::Borrow)
            && tx.borrow_apr.is_some()
            && tx.borrow_term_days.is_some()
            && balance.terms_from.map_or(true, |prev| prev.date <= tx.date)
        {
            balance.terms_from = Some(tx);
        }
    }

    let basis = Decimal::from(day_count_basis.max(1));
    let mut projections = Vec::new();
    for ((account, asset), balance) in balances {
        if balance.principal <= Decimal::zero() || !is_quantity_significant(&balance.principal) {
            continue;
        }
        let Some(borrow) = balance.terms_from else {
            warn!(
                "Borrow balance {} {} on {} has no APR/term; not projected",
                balance.principal, asset, account
            );
            continue;
        };
        let (Some(apr), Some(term_days)) = (borrow.borrow_apr, borrow.borrow_term_days) else {
            continue;
        };

        let maturity_date = add_days(borrow.date, term_days);
        let days_remaining = days_until(as_of, maturity_date);
        let interest_accrued = balance.principal * apr * Decimal::from(days_remaining) / basis;

        projections.push(OutflowProjection {
            account,
            asset,
            remaining_principal: balance.principal,
            apr,
            borrow_date: borrow.date,
            maturity_date,
            days_remaining,
            interest_accrued,
            total_outflow: balance.principal + interest_accrued,
        });
    }

    debug!("Projected {} borrow outflows as of {}", projections.len(), as_of);
    projections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::{DerivationRules, NewTransaction};
    use rust_decimal_macros::dec;

    fn day(n: u32) -> NaiveDate {
        add_days(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), n)
    }

    fn derive(tx: NewTransaction) -> Transaction {
        DerivationRules::default().apply(tx).unwrap()
    }

    fn borrow(n: u32, amount: Decimal) -> NewTransaction {
        NewTransaction::new(
            day(n),
            TransactionType::Borrow,
            "USD",
            "Margin",
            amount,
            dec!(1),
        )
    }

    fn repay(n: u32, amount: Decimal) -> Transaction {
        derive(NewTransaction::new(
            day(n),
            TransactionType::RepayBorrow,
            "USD",
            "Margin",
            amount,
            dec!(1),
        ))
    }

    #[test]
    fn test_projects_interest_on_remaining_principal() {
        let transactions = vec![
            derive(borrow(0, dec!(1000)).with_borrow_terms(dec!(0.12), 30)),
            repay(5, dec!(200)),
        ];

        // Borrowed 2024-01-01, matures 2024-01-31, evaluated 2024-01-15.
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let projections = project_borrow_outflows(&transactions, as_of, 365);

        assert_eq!(projections.len(), 1);
        let p = &projections[0];
        assert_eq!(p.remaining_principal, dec!(800));
        assert_eq!(p.maturity_date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(p.days_remaining, 16);
        let expected = dec!(800) * dec!(0.12) * dec!(16) / dec!(365);
        assert_eq!(p.interest_accrued, expected);
        assert_eq!(p.total_outflow, dec!(800) + expected);
    }

    #[test]
    fn test_maturity_day_accrues_nothing() {
        let transactions = vec![derive(
            borrow(0, dec!(1000)).with_borrow_terms(dec!(0.365), 30),
        )];

        let day_before = project_borrow_outflows(&transactions, day(29), 365);
        assert_eq!(day_before[0].days_remaining, 1);
        assert_eq!(day_before[0].interest_accrued, dec!(1));

        let on_maturity = project_borrow_outflows(&transactions, day(30), 365);
        assert_eq!(on_maturity[0].days_remaining, 0);
        assert!(on_maturity[0].interest_accrued.is_zero());
        assert_eq!(on_maturity[0].total_outflow, dec!(1000));
    }

    #[test]
    fn test_past_maturity_accrues_nothing() {
        let transactions = vec![derive(
            borrow(0, dec!(1000)).with_borrow_terms(dec!(0.12), 30),
        )];

        let projections = project_borrow_outflows(&transactions, day(45), 365);

        assert_eq!(projections[0].days_remaining, 0);
        assert!(projections[0].interest_accrued.is_zero());
        assert_eq!(projections[0].total_outflow, dec!(1000));
    }

    #[test]
    fn test_skips_borrows_without_terms_and_repaid_balances() {
        let mut other_account = borrow(0, dec!(50));
        other_account.account = "Friend".to_string();

        let transactions = vec![
            derive(borrow(0, dec!(300)).with_borrow_terms(dec!(0.05), 60)),
            repay(10, dec!(300)),
            derive(other_account),
        ];

        let projections = project_borrow_outflows(&transactions, day(20), 365);
        assert!(projections.is_empty());
    }

    #[test]
    fn test_latest_borrow_supplies_terms() {
        let transactions = vec![
            derive(borrow(0, dec!(100)).with_borrow_terms(dec!(0.10), 30)),
            derive(borrow(10, dec!(100)).with_borrow_terms(dec!(0.20), 90)),
            derive(borrow(12, dec!(50))),
        ];

        let projections = project_borrow_outflows(&transactions, day(20), 365);

        let p = &projections[0];
        assert_eq!(p.remaining_principal, dec!(250));
        assert_eq!(p.apr, dec!(0.20));
        assert_eq!(p.borrow_date, day(10));
        assert_eq!(p.days_remaining, 80);
    }

    #[test]
    fn test_future_transactions_ignored() {
        let transactions = vec![
            derive(borrow(0, dec!(1000)).with_borrow_terms(dec!(0.12), 30)),
            repay(20, dec!(1000)),
        ];

        let projections = project_borrow_outflows(&transactions, day(15), 365);
        assert_eq!(projections[0].remaining_principal, dec!(1000));
    }
}
