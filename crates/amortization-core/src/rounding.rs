//! Canonical two-decimal monetary rounding.
//!
//! Every monetary quantity produced anywhere in the crate passes through
//! [`round2`] immediately after it is computed. Totals are sums of values
//! that were already rounded, never the rounding of an unrounded sum.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::types::Money;

/// Smallest representable monetary step.
pub const ONE_CENT: Money = dec!(0.01);

/// Round to 2 decimal places, half away from zero.
pub fn round2(value: Decimal) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sum already-rounded values and round the result.
pub fn sum_rounded<I>(values: I) -> Money
where
    I: IntoIterator<Item = Money>,
{
    round2(values.into_iter().fold(Decimal::ZERO, |acc, v| acc + v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round2(dec!(1.004)), dec!(1.00));
    }

    #[test]
    fn test_round2_repeating_fraction() {
        assert_eq!(round2(dec!(100000) / dec!(120)), dec!(833.33));
        assert_eq!(round2(dec!(833.3333)), dec!(833.33));
        assert_eq!(round2(dec!(1.006)), dec!(1.01));
    }

    #[test]
    fn test_sum_rounded() {
        let total = sum_rounded(vec![dec!(0.10), dec!(0.20), dec!(0.30)]);
        assert_eq!(total, dec!(0.60));
        assert_eq!(sum_rounded(Vec::<Money>::new()), Decimal::ZERO);
    }
}
