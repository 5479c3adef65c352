//! Pure folds from transactions to net quantities.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::holdings_model::HoldingsSnapshot;
use crate::lots::is_quantity_significant;
use crate::transactions::Transaction;

/// `(asset, account)`; the account is `None` when folding per asset.
pub type HoldingKey = (String, Option<String>);

fn fold<F>(
    transactions: &[Transaction],
    as_of: NaiveDate,
    key_of: F,
) -> BTreeMap<HoldingKey, Decimal>
where
    F: Fn(&Transaction) -> HoldingKey,
{
    let mut quantities: BTreeMap<HoldingKey, Decimal> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| tx.date <= as_of) {
        *quantities.entry(key_of(tx)).or_insert(Decimal::ZERO) += tx.delta_qty;
    }
    quantities.retain(|_, qty| is_quantity_significant(qty));
    quantities
}

/// Net quantity per `(asset, account)` from every transaction dated on or before `as_of`.
///
/// Fully exited holdings are dropped.
pub fn net_quantities_by_account(
    transactions: &[Transaction],
    as_of: NaiveDate,
) -> BTreeMap<HoldingKey, Decimal> {
    fold(transactions, as_of, |tx| (tx.asset.clone(), Some(tx.account.clone())))
}

/// Net quantity per asset, all accounts combined.
pub fn net_quantities_by_asset(
    transactions: &[Transaction],
    as_of: NaiveDate,
) -> BTreeMap<HoldingKey, Decimal> {
    fold(transactions, as_of, |tx| (tx.asset.clone(), None))
}

/// Sets each holding's share of the summed value. A zero total yields zero shares.
pub fn assign_percentages(holdings: &mut [HoldingsSnapshot]) -> Decimal {
    let total: Decimal = holdings.iter().map(|h| h.value_usd).sum();
    for holding in holdings.iter_mut() {
        holding.percentage = if total.is_zero() {
            Decimal::ZERO
        } else {
            holding.value_usd / total * dec!(100)
        };
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::{DerivationRules, NewTransaction, TransactionType};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn tx(day: u32, t: TransactionType, asset: &str, account: &str, qty: Decimal) -> Transaction {
        DerivationRules::default()
            .apply(NewTransaction::new(d(day), t, asset, account, qty, dec!(1)))
            .unwrap()
    }

    #[test]
    fn test_folds_by_account_up_to_cutoff() {
        let txs = vec![
            tx(1, TransactionType::Buy, "BTC", "Exchange", dec!(2)),
            tx(2, TransactionType::TransferOut, "BTC", "Exchange", dec!(0.5)),
            tx(2, TransactionType::TransferIn, "BTC", "Ledger", dec!(0.5)),
            tx(5, TransactionType::Sell, "BTC", "Exchange", dec!(1)),
        ];

        let on_third = net_quantities_by_account(&txs, d(3));
        assert_eq!(on_third[&("BTC".to_string(), Some("Exchange".to_string()))], dec!(1.5));
        assert_eq!(on_third[&("BTC".to_string(), Some("Ledger".to_string()))], dec!(0.5));

        let by_asset = net_quantities_by_asset(&txs, d(5));
        assert_eq!(by_asset[&("BTC".to_string(), None)], dec!(1));
    }

    #[test]
    fn test_fully_exited_holdings_are_omitted() {
        let txs = vec![
            tx(1, TransactionType::Buy, "ETH", "Exchange", dec!(3)),
            tx(2, TransactionType::Sell, "ETH", "Exchange", dec!(3)),
        ];
        assert!(net_quantities_by_account(&txs, d(2)).is_empty());
    }

    #[test]
    fn test_percentages_handle_zero_total() {
        let mut holdings = vec![HoldingsSnapshot {
            asset: "X".to_string(),
            account: None,
            quantity: dec!(1),
            price: dec!(0),
            value_usd: dec!(0),
            percentage: dec!(0),
            as_of: d(1),
        }];
        let total = assign_percentages(&mut holdings);
        assert_eq!(total, Decimal::ZERO);
        assert_eq!(holdings[0].percentage, Decimal::ZERO);
    }
}
