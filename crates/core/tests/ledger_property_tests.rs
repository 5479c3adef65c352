//! Property-based integration tests for derivation and FIFO lot matching.
//!
//! These tests verify that accounting invariants hold across generated inputs,
//! using the `proptest` crate for random test case generation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tallyfolio_core::lots::{LotLedger, PositionKey};
use tallyfolio_core::portfolio::holdings::{assign_percentages, HoldingsSnapshot};
use tallyfolio_core::portfolio::spending::calculate_spending;
use tallyfolio_core::transactions::{DerivationRules, NewTransaction, TransactionType};
use tallyfolio_core::Period;

// =============================================================================
// Generators
// =============================================================================

fn arb_transaction_type() -> impl Strategy<Value = TransactionType> {
    proptest::sample::select(TransactionType::ALL.to_vec())
}

/// Positive decimal with two fractional digits.
fn arb_positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_non_negative_amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_new_transaction() -> impl Strategy<Value = NewTransaction> {
    (
        arb_transaction_type(),
        arb_positive_amount(),     // quantity
        arb_non_negative_amount(), // price
        arb_non_negative_amount(), // fee
        (1i64..40_000).prop_map(|v| Decimal::new(v, 4)), // fx_to_usd
        any::<bool>(),             // internal
        any::<bool>(),             // credit account
        0u32..365,                 // day offset
    )
        .prop_map(|(t, quantity, price, fee, fx, internal, credit, offset)| {
            let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                + chrono::Duration::days(offset.into());
            let account = if credit { "Visa" } else { "Checking" };
            let mut tx = NewTransaction::new(date, t, "ASSET", account, quantity, price)
                .with_currency("EUR", fx, fx * dec!(25000))
                .with_fees(fee, fee * dec!(25000));
            tx.internal_flow = internal;
            tx
        })
}

/// Deposits as `(quantity, unit cost)` pairs.
fn arb_deposits() -> impl Strategy<Value = Vec<(Decimal, Decimal)>> {
    proptest::collection::vec(
        (
            (1i64..100_000).prop_map(|v| Decimal::new(v, 3)),
            (0i64..500_000).prop_map(|v| Decimal::new(v, 4)),
        ),
        1..8,
    )
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day.into())
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Deriving the same input twice yields identical fields.
    #[test]
    fn prop_derive_is_pure(tx in arb_new_transaction()) {
        let rules = DerivationRules::new(["Visa"]);
        let first = rules.derive(&tx).unwrap();
        let second = rules.derive(&tx).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Quantity sign follows the type, and internal legs never move cash.
    #[test]
    fn prop_derive_signs(tx in arb_new_transaction()) {
        let rules = DerivationRules::new(["Visa"]);
        let derived = rules.derive(&tx).unwrap();
        let transaction_type = tx.transaction_type.unwrap();

        if transaction_type.increases_holdings() {
            prop_assert_eq!(derived.delta_qty, tx.quantity);
        } else {
            prop_assert_eq!(derived.delta_qty, -tx.quantity);
        }

        if tx.internal_flow {
            prop_assert!(derived.cash_flow_usd.is_zero());
            prop_assert!(derived.cash_flow_vnd.is_zero());
        }
        if transaction_type == TransactionType::Expense && tx.account == "Visa" {
            prop_assert!(derived.cash_flow_usd.is_zero());
        }
    }

    /// Exhausting a position realizes exactly proceeds minus deposit cost.
    #[test]
    fn prop_full_close_conserves_value(
        deposits in arb_deposits(),
        chunks in proptest::collection::vec((1i64..50_000, 0i64..500_000), 1..12),
    ) {
        let key = PositionKey::new("ETH", "Staking", "long");
        let mut ledger = LotLedger::new();
        let mut investment_id = String::new();
        let mut total_quantity = Decimal::ZERO;
        let mut total_cost = Decimal::ZERO;
        for (i, (quantity, cost)) in deposits.iter().enumerate() {
            investment_id = ledger.deposit(&key, None, date(i as u32), *quantity, *cost).unwrap();
            total_quantity += *quantity;
            total_cost += *quantity * *cost;
        }

        let mut remaining = total_quantity;
        let mut total_proceeds = Decimal::ZERO;
        let mut total_realized = Decimal::ZERO;
        let mut day = 30;
        for (i, (size, price)) in chunks.iter().enumerate() {
            if remaining.is_zero() {
                break;
            }
            let last = i == chunks.len() - 1;
            let size = Decimal::new(*size, 3);
            let quantity = if last || size >= remaining { remaining } else { size };
            let price = Decimal::new(*price, 4);

            let entry = ledger.withdraw(&investment_id, date(day), quantity, price, false).unwrap();
            remaining -= quantity;
            total_proceeds += entry.proceeds_usd;
            total_realized += entry.realized_pnl_usd;
            day += 1;
        }

        prop_assert!(remaining.is_zero());
        prop_assert!(!ledger.position(&investment_id).unwrap().is_open);
        prop_assert_eq!(total_realized, total_proceeds - total_cost);
    }

    /// An over-withdrawal is rejected and leaves the lots untouched.
    #[test]
    fn prop_over_withdrawal_is_all_or_nothing(deposits in arb_deposits(), excess in 1i64..1000) {
        let key = PositionKey::new("ETH", "Staking", "long");
        let mut ledger = LotLedger::new();
        let mut investment_id = String::new();
        for (i, (quantity, cost)) in deposits.iter().enumerate() {
            investment_id = ledger.deposit(&key, None, date(i as u32), *quantity, *cost).unwrap();
        }
        let before = ledger.position(&investment_id).unwrap().clone();

        let requested = before.remaining_quantity() + Decimal::new(excess, 3);
        prop_assert!(ledger.withdraw(&investment_id, date(60), requested, dec!(1), false).is_err());
        prop_assert_eq!(ledger.position(&investment_id).unwrap(), &before);
        prop_assert!(ledger.realized_entries().is_empty());
    }

    /// Holding shares sum to 100 whenever anything has value.
    #[test]
    fn prop_holding_percentages_sum_to_hundred(
        values in proptest::collection::vec(0i64..10_000_000_000, 1..20)
    ) {
        prop_assume!(values.iter().any(|v| *v > 0));
        let mut holdings: Vec<HoldingsSnapshot> = values
            .iter()
            .enumerate()
            .map(|(i, v)| HoldingsSnapshot {
                asset: format!("A{}", i),
                account: None,
                quantity: Decimal::ONE,
                price: Decimal::new(*v, 2),
                value_usd: Decimal::new(*v, 2),
                percentage: Decimal::ZERO,
                as_of: date(0),
            })
            .collect();

        let total = assign_percentages(&mut holdings);
        let sum: Decimal = holdings.iter().map(|h| h.percentage).sum();

        prop_assert!(total > Decimal::ZERO);
        prop_assert!((sum - dec!(100)).abs() < dec!(0.000001));
    }

    /// Spending tag shares sum to 100 and never count deferred spend.
    #[test]
    fn prop_spending_tags_sum_to_hundred(
        expenses in proptest::collection::vec(
            (arb_positive_amount(), 0usize..4, any::<bool>()),
            1..30,
        )
    ) {
        let rules = DerivationRules::new(["Visa"]);
        let tags = ["Food", "Transport", "Rent", "Fun"];
        let transactions: Vec<_> = expenses
            .iter()
            .map(|(amount, tag, credit)| {
                let account = if *credit { "Visa" } else { "Checking" };
                rules
                    .apply(
                        NewTransaction::new(
                            date(5),
                            TransactionType::Expense,
                            "USD",
                            account,
                            *amount,
                            dec!(1),
                        )
                        .with_tag(tags[*tag]),
                    )
                    .unwrap()
            })
            .collect();
        let cash_total: Decimal = expenses
            .iter()
            .filter(|(_, _, credit)| !credit)
            .map(|(amount, _, _)| *amount)
            .sum();

        let period = Period::month(2024, 1).unwrap();
        let report = calculate_spending(&transactions, &period, 5);

        prop_assert_eq!(report.total_usd, cash_total);
        prop_assert!(report.top_expenses.len() <= 5);
        if !cash_total.is_zero() {
            let sum: Decimal = report.by_tag.values().map(|g| g.percentage).sum();
            prop_assert!((sum - dec!(100)).abs() < dec!(0.000001));
        }
    }
}
