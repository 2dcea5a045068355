//! Schedule model and construction from validated inputs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::debug;

use crate::engines::{generate_constant_periods, generate_declining_periods};
use crate::error::AmortizationError;
use crate::inputs::validate::ValidatedInputs;
use crate::rounding::{round2, sum_rounded};
use crate::types::*;
use crate::AmortizationResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Share of gross monthly income a first payment may commit before an
/// affordability warning is raised.
pub const DEFAULT_MAX_INCOME_COMMITMENT: Rate = dec!(0.30);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Repayment convention of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmortizationSystem {
    /// Fixed principal portion per period (SAC).
    #[serde(alias = "sac")]
    DecliningBalance,
    /// Fixed total payment per period (Price / French annuity).
    #[serde(alias = "price")]
    ConstantInstallment,
}

impl fmt::Display for AmortizationSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmortizationSystem::DecliningBalance => write!(f, "declining-balance"),
            AmortizationSystem::ConstantInstallment => write!(f, "constant-installment"),
        }
    }
}

/// One month of a schedule. All monetary fields are rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub month: u32,
    pub payment: Money,
    pub amortization: Money,
    pub interest: Money,
    /// Outstanding balance at the end of the month, after any extra payment.
    pub balance: Money,
    pub cumulative_interest: Money,
    pub cumulative_amortization: Money,
    /// Principal injected on top of the regular payment this month.
    #[serde(default, skip_serializing_if = "Decimal::is_zero")]
    pub extra_amortization: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total_payment: Money,
    pub total_interest: Money,
    pub total_amortization: Money,
    pub first_payment: Money,
    pub last_payment: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub system: AmortizationSystem,
    /// Months `1..=n`, contiguous. Empty only when the loan is fully paid off.
    pub periods: Vec<Period>,
    pub totals: Totals,
    pub periodic_rate: Rate,
    #[serde(default)]
    pub correction_rate: Rate,
}

impl Schedule {
    /// Wrap generated periods, deriving totals from them.
    pub fn from_periods(
        system: AmortizationSystem,
        periods: Vec<Period>,
        periodic_rate: Rate,
        correction_rate: Rate,
    ) -> Self {
        let totals = compute_totals(&periods);
        Schedule {
            system,
            periods,
            totals,
            periodic_rate,
            correction_rate,
        }
    }

    pub fn month_count(&self) -> u32 {
        self.periods.len() as u32
    }

    pub fn is_paid_off(&self) -> bool {
        self.periods.is_empty()
    }

    /// Original principal, reconstructed from the first period.
    pub fn principal(&self) -> Option<Money> {
        self.periods
            .first()
            .map(|p| round2(p.amortization + p.balance))
    }

    /// Period for a 1-based month number.
    pub fn period(&self, month: u32) -> Option<&Period> {
        month
            .checked_sub(1)
            .and_then(|idx| self.periods.get(idx as usize))
    }
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

/// Totals are sums of per-period rounded values; first and last payment are
/// zero for an empty schedule.
pub fn compute_totals(periods: &[Period]) -> Totals {
    Totals {
        total_payment: sum_rounded(periods.iter().map(|p| p.payment)),
        total_interest: sum_rounded(periods.iter().map(|p| p.interest)),
        total_amortization: sum_rounded(periods.iter().map(|p| p.amortization)),
        first_payment: periods.first().map_or(Decimal::ZERO, |p| p.payment),
        last_payment: periods.last().map_or(Decimal::ZERO, |p| p.payment),
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Build the base schedule for `system` from validated inputs.
pub fn build_schedule(
    system: AmortizationSystem,
    inputs: &ValidatedInputs,
) -> AmortizationResult<Schedule> {
    let principal = inputs.financed_amount;
    let term = inputs.term_months;
    let rate = inputs.monthly_interest_rate;
    let correction = inputs.monthly_correction_rate;

    let periods = match system {
        AmortizationSystem::DecliningBalance => {
            generate_declining_periods(principal, term, rate, correction)?
        }
        AmortizationSystem::ConstantInstallment => {
            generate_constant_periods(principal, term, rate, correction)?
        }
    };

    let schedule = Schedule::from_periods(system, periods, rate, correction);
    debug!(
        %system,
        term,
        total_interest = %schedule.totals.total_interest,
        "schedule built"
    );
    Ok(schedule)
}

/// Warning text when `payment` commits more than `max_commitment` of income.
pub fn affordability_warning(
    payment: Money,
    total_gross_income: Money,
    max_commitment: Rate,
) -> Option<String> {
    if total_gross_income <= Decimal::ZERO {
        return None;
    }
    let limit = round2(total_gross_income * max_commitment);
    if payment > limit {
        Some(format!(
            "Payment {payment} exceeds {}% of gross monthly income (limit {limit})",
            round2(max_commitment * dec!(100)).normalize()
        ))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub inputs: ValidatedInputs,
    pub system: AmortizationSystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_income_commitment: Option<Rate>,
}

/// Build a single schedule and flag an unaffordable first payment.
pub fn analyze_schedule(input: &ScheduleInput) -> AmortizationResult<ComputationOutput<Schedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if let Some(ratio) = input.max_income_commitment {
        if ratio <= Decimal::ZERO {
            return Err(AmortizationError::InvalidInput {
                field: "max_income_commitment".into(),
                reason: "Income commitment ratio must be positive".into(),
            });
        }
    }

    let schedule = build_schedule(input.system, &input.inputs)?;

    let ratio = input
        .max_income_commitment
        .unwrap_or(DEFAULT_MAX_INCOME_COMMITMENT);
    if let Some(w) = affordability_warning(
        schedule.totals.first_payment,
        input.inputs.total_gross_income,
        ratio,
    ) {
        warnings.push(w);
    }

    let methodology = match input.system {
        AmortizationSystem::DecliningBalance => "Declining-Balance Amortization (SAC)",
        AmortizationSystem::ConstantInstallment => "Constant-Installment Amortization (Price)",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, schedule))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(principal: Money, term: u32, rate: Rate) -> ValidatedInputs {
        ValidatedInputs::new(principal, term, rate)
    }

    #[test]
    fn test_build_declining_totals() {
        let schedule = build_schedule(
            AmortizationSystem::DecliningBalance,
            &inputs(dec!(120000), 12, dec!(0.01)),
        )
        .unwrap();
        assert_eq!(schedule.month_count(), 12);
        assert_eq!(schedule.totals.total_interest, dec!(7800.00));
        assert_eq!(schedule.totals.total_payment, dec!(127800.00));
        assert_eq!(schedule.totals.total_amortization, dec!(120000.00));
        assert_eq!(schedule.totals.first_payment, dec!(11200.00));
        assert_eq!(schedule.totals.last_payment, dec!(10100.00));
        assert_eq!(schedule.principal(), Some(dec!(120000.00)));
    }

    #[test]
    fn test_build_constant_labels_and_length() {
        let schedule = build_schedule(
            AmortizationSystem::ConstantInstallment,
            &inputs(dec!(10000), 12, dec!(0.01)),
        )
        .unwrap();
        assert_eq!(schedule.system, AmortizationSystem::ConstantInstallment);
        assert_eq!(schedule.month_count(), 12);
        assert_eq!(schedule.totals.first_payment, dec!(888.49));
        assert_eq!(schedule.periodic_rate, dec!(0.01));
    }

    #[test]
    fn test_compute_totals_empty() {
        let totals = compute_totals(&[]);
        assert_eq!(totals.total_payment, Decimal::ZERO);
        assert_eq!(totals.first_payment, Decimal::ZERO);
        assert_eq!(totals.last_payment, Decimal::ZERO);
    }

    #[test]
    fn test_period_lookup_is_one_based() {
        let schedule = build_schedule(
            AmortizationSystem::DecliningBalance,
            &inputs(dec!(1200), 12, dec!(0.01)),
        )
        .unwrap();
        assert_eq!(schedule.period(1).map(|p| p.month), Some(1));
        assert_eq!(schedule.period(12).map(|p| p.month), Some(12));
        assert!(schedule.period(0).is_none());
        assert!(schedule.period(13).is_none());
    }

    #[test]
    fn test_affordability_warning() {
        assert!(affordability_warning(dec!(3100), dec!(10000), dec!(0.30)).is_some());
        assert!(affordability_warning(dec!(3000), dec!(10000), dec!(0.30)).is_none());
        assert!(affordability_warning(dec!(3100), Decimal::ZERO, dec!(0.30)).is_none());
    }

    #[test]
    fn test_analyze_schedule_envelope() {
        let mut validated = inputs(dec!(400000), 360, dec!(0.008));
        validated.total_gross_income = dec!(5000);
        let out = analyze_schedule(&ScheduleInput {
            inputs: validated,
            system: AmortizationSystem::DecliningBalance,
            max_income_commitment: None,
        })
        .unwrap();
        assert_eq!(out.result.month_count(), 360);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.methodology.contains("SAC"));
    }

    #[test]
    fn test_system_accepts_short_aliases() {
        let sac: AmortizationSystem = serde_json::from_str("\"sac\"").unwrap();
        let price: AmortizationSystem = serde_json::from_str("\"price\"").unwrap();
        assert_eq!(sac, AmortizationSystem::DecliningBalance);
        assert_eq!(price, AmortizationSystem::ConstantInstallment);
    }
}
