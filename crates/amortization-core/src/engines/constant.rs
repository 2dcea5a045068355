use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use super::{corrected_balance, validate_terms};
use crate::error::AmortizationError;
use crate::rounding::round2;
use crate::schedule::Period;
use crate::types::{Money, Rate};
use crate::AmortizationResult;

/// Constant installment for a fully amortizing loan:
/// `PV · i(1+i)^n / ((1+i)^n − 1)`, rounded to cents.
///
/// A zero rate has no annuity factor; the installment is then the flat
/// `principal / term`.
pub fn compute_installment(principal: Money, term: u32, rate: Rate) -> AmortizationResult<Money> {
    if term == 0 {
        return Err(AmortizationError::InvalidInput {
            field: "term".into(),
            reason: "Term must be at least one period".into(),
        });
    }

    if rate.is_zero() {
        return Ok(round2(principal / Decimal::from(term)));
    }

    let overflow = || AmortizationError::InvalidInput {
        field: "rate".into(),
        reason: format!("Annuity factor overflows for rate {rate} over {term} periods"),
    };
    let factor = (Decimal::ONE + rate)
        .checked_powu(u64::from(term))
        .ok_or_else(overflow)?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(AmortizationError::DivisionByZero {
            context: "installment annuity factor".into(),
        });
    }

    let numerator = rate
        .checked_mul(factor)
        .and_then(|v| v.checked_mul(principal))
        .ok_or_else(overflow)?;
    Ok(round2(numerator / denominator))
}

/// Generate a constant-installment (Price) schedule.
///
/// The installment is derived once from the uncorrected inputs. Every period
/// but the last pays exactly that installment; the last amortizes the exact
/// remaining balance, so its payment may differ by a few cents.
pub fn generate_constant_periods(
    principal: Money,
    term: u32,
    rate: Rate,
    correction: Rate,
) -> AmortizationResult<Vec<Period>> {
    validate_terms(principal, term, rate)?;

    let installment = compute_installment(principal, term, rate)?;
    let mut periods = Vec::with_capacity(term as usize);
    let mut balance = principal;
    let mut cumulative_interest = Decimal::ZERO;
    let mut cumulative_amortization = Decimal::ZERO;

    for month in 1..=term {
        let opening = corrected_balance(balance, correction);
        let interest = round2(opening * rate);
        let is_last = month == term;
        let (amortization, payment) = if is_last {
            let amortization = round2(opening);
            (amortization, round2(amortization + interest))
        } else {
            (round2(installment - interest), installment)
        };

        cumulative_interest = round2(cumulative_interest + interest);
        cumulative_amortization = round2(cumulative_amortization + amortization);
        balance = if is_last {
            Decimal::ZERO
        } else {
            round2(opening - amortization)
        };

        periods.push(Period {
            month,
            payment,
            amortization,
            interest,
            balance,
            cumulative_interest,
            cumulative_amortization,
            extra_amortization: Decimal::ZERO,
        });
    }

    Ok(periods)
}

/// Number of periods a fixed installment needs to retire `balance`:
/// `ceil( ln(PMT / (PMT − balance·i)) / ln(1+i) )`.
///
/// Fails when the installment does not exceed the interest accruing on the
/// balance, since such a loan never amortizes.
pub fn solve_remaining_term(balance: Money, installment: Money, rate: Rate) -> AmortizationResult<u32> {
    if balance <= Decimal::ZERO {
        return Ok(0);
    }
    if installment <= Decimal::ZERO {
        return Err(AmortizationError::FinancialImpossibility(format!(
            "Installment {installment} cannot retire balance {balance}"
        )));
    }

    let periods = if rate.is_zero() {
        balance / installment
    } else {
        let denominator = installment - balance * rate;
        if denominator <= Decimal::ZERO {
            return Err(AmortizationError::FinancialImpossibility(format!(
                "Installment {installment} cannot cover interest on reduced balance {balance}"
            )));
        }
        (installment / denominator).ln() / (Decimal::ONE + rate).ln()
    };

    periods
        .ceil()
        .to_u32()
        .ok_or_else(|| AmortizationError::InvalidInput {
            field: "remaining_term".into(),
            reason: format!("Remaining term {periods} is out of range"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_installment_known_answer() {
        assert_eq!(compute_installment(dec!(10000), 12, dec!(0.01)).unwrap(), dec!(888.49));
        assert_eq!(compute_installment(dec!(30000), 12, dec!(0.015)).unwrap(), dec!(2750.40));
        assert_eq!(compute_installment(dec!(100000), 10, dec!(0.01)).unwrap(), dec!(10558.21));
    }

    #[test]
    fn test_installment_overflowing_factor_is_an_error() {
        let err = compute_installment(dec!(100000), 420, dec!(1.0)).unwrap_err();
        assert!(matches!(err, AmortizationError::InvalidInput { ref field, .. } if field == "rate"));

        let err = generate_constant_periods(dec!(100000), 420, dec!(1.0), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, AmortizationError::InvalidInput { .. }));
    }

    #[test]
    fn test_installment_zero_rate_is_flat() {
        assert_eq!(compute_installment(dec!(1200), 12, Decimal::ZERO).unwrap(), dec!(100.00));
    }

    #[test]
    fn test_total_interest_known_answer() {
        let periods = generate_constant_periods(dec!(10000), 12, dec!(0.01), Decimal::ZERO).unwrap();
        let total: Decimal = periods.iter().map(|p| p.interest).sum();
        assert!((total - dec!(661.88)).abs() <= dec!(0.05), "got {total}");
    }

    #[test]
    fn test_payment_constant_until_last() {
        let periods = generate_constant_periods(dec!(10000), 12, dec!(0.01), Decimal::ZERO).unwrap();
        for p in &periods[..11] {
            assert_eq!(p.payment, dec!(888.49));
        }
        let last = periods.last().unwrap();
        assert_eq!(last.balance, Decimal::ZERO);
        assert!((last.payment - dec!(888.49)).abs() < dec!(0.10));
    }

    #[test]
    fn test_amortization_grows() {
        let periods = generate_constant_periods(dec!(10000), 12, dec!(0.01), Decimal::ZERO).unwrap();
        for pair in periods[..11].windows(2) {
            assert!(pair[1].amortization > pair[0].amortization);
        }
    }

    #[test]
    fn test_remaining_term_round_trip() {
        let pmt = compute_installment(dec!(100000), 10, dec!(0.01)).unwrap();
        assert_eq!(solve_remaining_term(dec!(100000), pmt, dec!(0.01)).unwrap(), 10);
    }

    #[test]
    fn test_remaining_term_reduced_balance() {
        let pmt = compute_installment(dec!(100000), 10, dec!(0.01)).unwrap();
        assert_eq!(solve_remaining_term(dec!(50000), pmt, dec!(0.01)).unwrap(), 5);
    }

    #[test]
    fn test_remaining_term_uncoverable_interest() {
        let result = solve_remaining_term(dec!(1000000), dec!(100), dec!(0.01));
        assert!(matches!(result, Err(AmortizationError::FinancialImpossibility(_))));
    }

    #[test]
    fn test_remaining_term_zero_rate() {
        assert_eq!(solve_remaining_term(dec!(1050), dec!(100), Decimal::ZERO).unwrap(), 11);
    }
}
