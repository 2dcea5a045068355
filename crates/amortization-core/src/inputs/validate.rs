//! Normalisation of user-entered loan parameters.
//!
//! Turns [`RawInputs`] (percentages, property value, incomes) into the
//! [`ValidatedInputs`] consumed by the schedule engines. Every rule is
//! checked and every failure reported, not just the first one.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{AmortizationError, FieldError};
use crate::types::{Money, Rate};
use crate::AmortizationResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Housing-finance ceiling on the property value.
pub const PROPERTY_VALUE_CEILING: Money = dec!(2250000);

/// Earmarked funds cannot be used above this property value.
pub const EARMARKED_PROPERTY_CEILING: Money = dec!(1500000);

pub const MIN_DOWN_PAYMENT_PCT: Decimal = dec!(20);
pub const MAX_ANNUAL_RATE_PCT: Decimal = dec!(12);
pub const MAX_TERM_MONTHS: u32 = 420;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Loan parameters as entered. Percentages are whole numbers (10 = 10%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInputs {
    pub property_value: Money,
    pub down_payment_pct: Decimal,
    pub term_months: u32,
    pub annual_interest_rate_pct: Decimal,
    pub gross_monthly_income: Money,
    pub net_monthly_income: Money,
    #[serde(default)]
    pub earmarked_balance: Money,
    #[serde(default)]
    pub co_borrower_income: Money,
    #[serde(default)]
    pub monthly_correction_pct: Decimal,
}

/// Normalised inputs for the schedule engines. Rates are decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedInputs {
    pub financed_amount: Money,
    pub term_months: u32,
    pub monthly_interest_rate: Rate,
    #[serde(default)]
    pub monthly_correction_rate: Rate,
    /// Borrower plus co-borrower gross income; zero when unknown.
    #[serde(default)]
    pub total_gross_income: Money,
}

impl ValidatedInputs {
    /// Inputs with no correction and no income information.
    pub fn new(financed_amount: Money, term_months: u32, monthly_interest_rate: Rate) -> Self {
        ValidatedInputs {
            financed_amount,
            term_months,
            monthly_interest_rate,
            monthly_correction_rate: Decimal::ZERO,
            total_gross_income: Decimal::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate raw inputs and derive the financed amount and monthly rates.
pub fn validate_inputs(raw: &RawInputs) -> AmortizationResult<ValidatedInputs> {
    let mut errors: Vec<FieldError> = Vec::new();
    let mut fail = |field: &str, message: &str| {
        errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        })
    };

    if raw.property_value <= Decimal::ZERO {
        fail("property_value", "Required field");
    } else if raw.property_value > PROPERTY_VALUE_CEILING {
        fail(
            "property_value",
            "Property value exceeds the housing-finance ceiling (2,250,000)",
        );
    }

    if raw.down_payment_pct < MIN_DOWN_PAYMENT_PCT {
        fail(
            "down_payment_pct",
            "Down payment must be at least 20% of the property value",
        );
    }

    if raw.term_months < 1 || raw.term_months > MAX_TERM_MONTHS {
        fail("term_months", "Term must be between 1 and 420 months");
    }

    if raw.annual_interest_rate_pct <= Decimal::ZERO {
        fail("annual_interest_rate_pct", "Required field");
    } else if raw.annual_interest_rate_pct > MAX_ANNUAL_RATE_PCT {
        fail(
            "annual_interest_rate_pct",
            "Rate exceeds the housing-finance limit (12% per year)",
        );
    }

    if raw.gross_monthly_income <= Decimal::ZERO {
        fail("gross_monthly_income", "Required field");
    }

    if raw.net_monthly_income <= Decimal::ZERO {
        fail("net_monthly_income", "Required field");
    }

    if raw.earmarked_balance > Decimal::ZERO && raw.property_value > EARMARKED_PROPERTY_CEILING {
        fail(
            "earmarked_balance",
            "Earmarked funds are not available for properties above 1,500,000",
        );
    }

    if raw.monthly_correction_pct < Decimal::ZERO {
        fail("monthly_correction_pct", "Correction rate cannot be negative");
    }

    if !errors.is_empty() {
        return Err(AmortizationError::Validation(errors));
    }

    let financed_amount = raw.property_value * (Decimal::ONE - raw.down_payment_pct / dec!(100));
    let annual = Decimal::ONE + raw.annual_interest_rate_pct / dec!(100);
    let monthly_interest_rate = annual.powd(Decimal::ONE / dec!(12)) - Decimal::ONE;

    Ok(ValidatedInputs {
        financed_amount,
        term_months: raw.term_months,
        monthly_interest_rate,
        monthly_correction_rate: raw.monthly_correction_pct / dec!(100),
        total_gross_income: raw.gross_monthly_income + raw.co_borrower_income,
    })
}
