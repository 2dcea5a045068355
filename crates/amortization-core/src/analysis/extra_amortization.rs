//! Replays a schedule from its original principal while injecting extra
//! principal payments.
//!
//! Under [`ExtraPolicy::ReduceTerm`] the governing amortization (declining
//! balance) or installment (constant installment) is kept, so the loan ends
//! early. Under [`ExtraPolicy::ReduceInstallment`] the governing value is
//! re-derived from the reduced balance and the months left in the original
//! horizon after every extra payment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

use super::{replay_reference, ExtraPolicy, SavingsSummary};
use crate::engines::compute_installment;
use crate::error::AmortizationError;
use crate::inputs::validate::ValidatedInputs;
use crate::rounding::{round2, sum_rounded, ONE_CENT};
use crate::schedule::{AmortizationSystem, Period, Schedule, Totals};
use crate::types::*;
use crate::AmortizationResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum gap between two uses of earmarked funds.
pub const EARMARK_MIN_INTERVAL_MONTHS: u32 = 24;

/// Replay iterations allowed, as a multiple of the base horizon.
const SAFETY_HORIZON_MULTIPLIER: u32 = 2;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraPaymentKind {
    OneTime,
    /// Repeats every month from `month` to the end of the base horizon.
    Recurring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraPayment {
    pub kind: ExtraPaymentKind,
    pub amount: Money,
    pub month: u32,
    #[serde(default)]
    pub policy: ExtraPolicy,
    /// Paid from earmarked funds, which are subject to a minimum interval.
    #[serde(default)]
    pub is_earmarked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraAmortizationResult {
    pub modified: Schedule,
    pub savings: SavingsSummary,
    pub policy: ExtraPolicy,
    /// Extra principal actually applied, after capping at the balance.
    pub total_extra_applied: Money,
}

// ---------------------------------------------------------------------------
// Earmarked-funds rule
// ---------------------------------------------------------------------------

/// Check that earmarked extras are at least 24 months apart.
///
/// Advisory only: returns the violation message, never fails.
pub fn validate_earmarked_intervals(payments: &[ExtraPayment]) -> Option<String> {
    let mut months: Vec<u32> = payments
        .iter()
        .filter(|p| p.is_earmarked)
        .map(|p| p.month)
        .collect();
    months.sort_unstable();

    let violated = months
        .windows(2)
        .any(|pair| pair[1] - pair[0] < EARMARK_MIN_INTERVAL_MONTHS);

    if violated {
        Some(format!(
            "Earmarked funds require a minimum interval of {EARMARK_MIN_INTERVAL_MONTHS} months between uses"
        ))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Month → summed extra amount, with recurring entries expanded to `horizon`.
fn expand_extra_payments(payments: &[ExtraPayment], horizon: u32) -> BTreeMap<u32, Money> {
    let mut by_month: BTreeMap<u32, Money> = BTreeMap::new();
    for payment in payments.iter().filter(|p| p.amount > Decimal::ZERO) {
        let months = match payment.kind {
            ExtraPaymentKind::OneTime => payment.month..=payment.month,
            ExtraPaymentKind::Recurring => payment.month..=horizon,
        };
        for month in months {
            *by_month.entry(month).or_insert(Decimal::ZERO) += payment.amount;
        }
    }
    by_month
}

/// One policy governs the whole batch: the first entry's.
fn governing_policy(payments: &[ExtraPayment]) -> ExtraPolicy {
    payments.first().map(|p| p.policy).unwrap_or_default()
}

/// Replay `base` with the given extra payments applied.
///
/// The replay keeps the base schedule's periodic rate but ignores any
/// monetary correction. Without extras it reproduces an uncorrected base
/// schedule exactly.
pub fn simulate_extra_amortization(
    base: &Schedule,
    extra_payments: &[ExtraPayment],
) -> AmortizationResult<ExtraAmortizationResult> {
    let first = base
        .periods
        .first()
        .ok_or_else(|| AmortizationError::InvalidInput {
            field: "base_schedule".into(),
            reason: "Base schedule has no periods".into(),
        })?;

    let horizon = base.month_count();
    let rate = base.periodic_rate;
    let extras_by_month = expand_extra_payments(extra_payments, horizon);
    let policy = governing_policy(extra_payments);
    let safety_bound = horizon.saturating_mul(SAFETY_HORIZON_MULTIPLIER);

    let mut balance = round2(first.amortization + first.balance);
    let mut fixed_amortization = first.amortization;
    let mut installment = first.payment;
    let mut cumulative_interest = Decimal::ZERO;
    let mut cumulative_amortization = Decimal::ZERO;
    let mut total_extra_applied = Decimal::ZERO;
    let mut periods: Vec<Period> = Vec::with_capacity(horizon as usize);
    let mut month = 0u32;

    while balance > Decimal::ZERO {
        if month >= safety_bound {
            warn!(month, %balance, "extra amortization replay hit its safety bound");
            return Err(AmortizationError::ConvergenceFailure {
                function: "extra amortization replay".into(),
                iterations: month,
            });
        }
        month += 1;

        let interest = round2(balance * rate);
        let is_final = month >= horizon;
        let amortization = if is_final {
            balance
        } else {
            match base.system {
                AmortizationSystem::DecliningBalance => fixed_amortization.min(balance),
                AmortizationSystem::ConstantInstallment => {
                    let payment = installment.min(round2(balance + interest));
                    round2(payment - interest).min(balance)
                }
            }
        };
        let payment = round2(amortization + interest);

        cumulative_interest = round2(cumulative_interest + interest);
        cumulative_amortization = round2(cumulative_amortization + amortization);
        balance = round2(balance - amortization);

        let mut applied = Decimal::ZERO;
        if let Some(&extra) = extras_by_month.get(&month) {
            if balance > Decimal::ZERO {
                applied = extra.min(balance);
                // A residual of a cent or less is settled with the extra.
                if balance - applied <= ONE_CENT {
                    applied = balance;
                }
                balance = round2(balance - applied);
                cumulative_amortization = round2(cumulative_amortization + applied);
                total_extra_applied = round2(total_extra_applied + applied);

                let remaining = horizon.saturating_sub(month);
                if policy == ExtraPolicy::ReduceInstallment && balance > Decimal::ZERO && remaining > 0 {
                    match base.system {
                        AmortizationSystem::DecliningBalance => {
                            fixed_amortization = round2(balance / Decimal::from(remaining));
                        }
                        AmortizationSystem::ConstantInstallment => {
                            installment = compute_installment(balance, remaining, rate)?;
                        }
                    }
                }
            }
        }

        periods.push(Period {
            month,
            payment,
            amortization,
            interest,
            balance,
            cumulative_interest,
            cumulative_amortization,
            extra_amortization: applied,
        });
    }

    let regular_payment = sum_rounded(periods.iter().map(|p| p.payment));
    let regular_amortization = sum_rounded(periods.iter().map(|p| p.amortization));
    let totals = Totals {
        total_payment: round2(regular_payment + total_extra_applied),
        total_interest: sum_rounded(periods.iter().map(|p| p.interest)),
        total_amortization: round2(regular_amortization + total_extra_applied),
        first_payment: periods.first().map_or(Decimal::ZERO, |p| p.payment),
        last_payment: periods.last().map_or(Decimal::ZERO, |p| p.payment),
    };

    let savings = SavingsSummary::against(
        base,
        totals.total_interest,
        totals.total_payment,
        periods.len() as u32,
    );

    debug!(
        system = %base.system,
        %policy,
        months = periods.len(),
        interest_saved = %savings.interest_saved,
        "extra amortization replay finished"
    );

    Ok(ExtraAmortizationResult {
        modified: Schedule {
            system: base.system,
            periods,
            totals,
            periodic_rate: rate,
            correction_rate: Decimal::ZERO,
        },
        savings,
        policy,
        total_extra_applied,
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraAmortizationInput {
    pub inputs: ValidatedInputs,
    pub system: AmortizationSystem,
    pub extra_payments: Vec<ExtraPayment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraAmortizationOutput {
    /// Totals of the schedule the simulation is measured against.
    pub base_totals: Totals,
    /// Totals with monetary correction applied, when a correction rate is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_base_totals: Option<Totals>,
    pub base_months: u32,
    pub simulation: ExtraAmortizationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earmark_violation: Option<String>,
}

/// Build the base schedule and simulate the requested extra payments.
pub fn analyze_extra_amortization(
    input: &ExtraAmortizationInput,
) -> AmortizationResult<ComputationOutput<ExtraAmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    for (idx, payment) in input.extra_payments.iter().enumerate() {
        if payment.month == 0 || payment.month > input.inputs.term_months {
            return Err(AmortizationError::InvalidInput {
                field: format!("extra_payments[{idx}].month"),
                reason: format!("Month must be within 1..={}", input.inputs.term_months),
            });
        }
        if payment.amount < Decimal::ZERO {
            return Err(AmortizationError::InvalidInput {
                field: format!("extra_payments[{idx}].amount"),
                reason: "Extra payment amount cannot be negative".into(),
            });
        }
    }

    let policy = governing_policy(&input.extra_payments);
    if input.extra_payments.iter().any(|p| p.policy != policy) {
        warnings.push(format!(
            "Extra payments specify different policies; {policy} from the first entry applies to all"
        ));
    }

    let earmark_violation = validate_earmarked_intervals(&input.extra_payments);
    if let Some(ref message) = earmark_violation {
        warn!(%message, "earmarked funds interval rule violated");
        warnings.push(message.clone());
    }

    let (base, corrected_base_totals) =
        replay_reference(input.system, &input.inputs, &mut warnings)?;
    let simulation = simulate_extra_amortization(&base, &input.extra_payments)?;

    let output = ExtraAmortizationOutput {
        base_totals: base.totals.clone(),
        corrected_base_totals,
        base_months: base.month_count(),
        simulation,
        earmark_violation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Extra Amortization Simulation",
        input,
        warnings,
        elapsed,
        output,
    ))
}
