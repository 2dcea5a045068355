//! Period-by-period schedule generators.
//!
//! Both engines are pure functions of `(principal, term, periodic rate,
//! correction rate)`. Every monetary field they emit is rounded with
//! [`round2`](crate::rounding::round2) as soon as it is computed, and the
//! final period always absorbs whatever balance remains so the schedule
//! closes at exactly zero.

pub mod constant;
pub mod declining;

use rust_decimal::Decimal;

use crate::error::AmortizationError;
use crate::types::{Money, Rate};
use crate::AmortizationResult;

pub use constant::{compute_installment, generate_constant_periods, solve_remaining_term};
pub use declining::generate_declining_periods;

/// Balance on which a period's interest and amortization are computed.
///
/// A positive monthly correction rate inflates the outstanding balance
/// before interest accrues.
pub(crate) fn corrected_balance(balance: Money, correction: Rate) -> Money {
    if correction > Decimal::ZERO {
        balance * (Decimal::ONE + correction)
    } else {
        balance
    }
}

pub(crate) fn validate_terms(principal: Money, term: u32, rate: Rate) -> AmortizationResult<()> {
    if principal <= Decimal::ZERO {
        return Err(AmortizationError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if term == 0 {
        return Err(AmortizationError::InvalidInput {
            field: "term".into(),
            reason: "Term must be at least one period".into(),
        });
    }
    if rate < Decimal::ZERO {
        return Err(AmortizationError::InvalidInput {
            field: "rate".into(),
            reason: "Periodic rate cannot be negative".into(),
        });
    }
    Ok(())
}
