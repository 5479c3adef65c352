use rust_decimal::Decimal;

use crate::errors::{Error, Result, ValidationError};

/// `a * b`, rejected as invalid input when the product does not fit a `Decimal`.
pub fn checked_product(what: &str, a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(what, a, "*", b))
}

/// `a + b`, rejected as invalid input on overflow.
pub fn checked_sum(what: &str, a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow(what, a, "+", b))
}

/// `a - b`, rejected as invalid input on overflow.
pub fn checked_difference(what: &str, a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_sub(b).ok_or_else(|| overflow(what, a, "-", b))
}

fn overflow(what: &str, a: Decimal, op: &str, b: Decimal) -> Error {
    ValidationError::InvalidInput(format!("{} overflows: {} {} {}", what, a, op, b)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_checked_product_in_range() {
        assert_eq!(
            checked_product("amount", dec!(12.5), dec!(4)).unwrap(),
            dec!(50)
        );
    }

    #[test]
    fn test_checked_product_overflow_is_invalid_input() {
        let err = checked_product("amount", dec!(100000000000000000000), dec!(1000000000))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidInput(ref msg)) if msg.contains("amount")
        ));
    }

    #[test]
    fn test_checked_sum_and_difference_overflow() {
        assert!(checked_sum("total", Decimal::MAX, dec!(1)).is_err());
        assert!(checked_difference("total", Decimal::MIN, dec!(1)).is_err());
        assert_eq!(
            checked_difference("total", dec!(10), dec!(2.5)).unwrap(),
            dec!(7.5)
        );
    }
}
