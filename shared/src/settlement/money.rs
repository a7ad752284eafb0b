//! Money helpers using rust_decimal for precision
//!
//! All amounts are GBP with 2 decimal places, rounded half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

use super::{SettlementError, SettlementResult};

/// Monetary precision (pence)
pub const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum accepted amount (£1,000,000)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Round to pence, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount * percent / 100`, rounded to pence
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_money(amount * percent / Decimal::ONE_HUNDRED)
}

/// Equal within one penny
pub fn money_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= MONEY_TOLERANCE
}

/// Validate an input amount and return it rounded to pence
pub fn validate_amount(value: Decimal, field: &'static str) -> SettlementResult<Decimal> {
    if value < Decimal::ZERO || value > MAX_AMOUNT {
        return Err(SettlementError::InvalidAmount {
            field,
            value,
            max: MAX_AMOUNT,
        });
    }
    Ok(round_money(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec("1.005")), dec("1.01"));
        assert_eq!(round_money(dec("1.004")), dec("1.00"));
        assert_eq!(round_money(dec("-1.005")), dec("-1.01"));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec("100"), dec("12.5")), dec("12.50"));
        assert_eq!(percent_of(dec("33.33"), dec("15")), dec("5.00"));
        assert_eq!(percent_of(dec("0"), dec("15")), Decimal::ZERO);
    }

    #[test]
    fn test_money_eq_tolerance() {
        assert!(money_eq(dec("10.00"), dec("10.004")));
        assert!(money_eq(dec("10.00"), dec("10.01")));
        assert!(money_eq(dec("10.01"), dec("10.00")));
        assert!(!money_eq(dec("10.00"), dec("10.02")));
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(dec("12.345"), "amount").unwrap(), dec("12.35"));
        assert_eq!(validate_amount(Decimal::ZERO, "amount").unwrap(), Decimal::ZERO);
        assert!(validate_amount(dec("-0.01"), "amount").is_err());
        assert!(validate_amount(dec("1000000.01"), "amount").is_err());
    }
}
