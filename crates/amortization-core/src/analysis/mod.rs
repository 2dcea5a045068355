//! Analyses derived from a base schedule: side-by-side comparison,
//! extra-payment simulation and interactive payment planning.

pub mod compare;
pub mod extra_amortization;
pub mod planning;

use serde::{Deserialize, Serialize};
use std::fmt;

use rust_decimal::Decimal;
use tracing::warn;

use crate::inputs::validate::ValidatedInputs;
use crate::rounding::round2;
use crate::schedule::{build_schedule, AmortizationSystem, Schedule, Totals};
use crate::types::Money;
use crate::AmortizationResult;

/// How extra principal is applied to the remainder of a loan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraPolicy {
    /// Keep the periodic amortization or installment; the term shortens.
    #[default]
    ReduceTerm,
    /// Keep the remaining term; the periodic payment shrinks.
    ReduceInstallment,
}

impl fmt::Display for ExtraPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraPolicy::ReduceTerm => write!(f, "reduce-term"),
            ExtraPolicy::ReduceInstallment => write!(f, "reduce-installment"),
        }
    }
}

/// What a modified schedule saves relative to its base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsSummary {
    pub interest_saved: Money,
    /// Periods removed from the base horizon; never negative.
    pub term_reduction: u32,
    pub total_saved: Money,
}

impl SavingsSummary {
    pub fn against(
        base: &Schedule,
        total_interest: Money,
        total_payment: Money,
        month_count: u32,
    ) -> Self {
        SavingsSummary {
            interest_saved: round2(base.totals.total_interest - total_interest),
            term_reduction: base.month_count().saturating_sub(month_count),
            total_saved: round2(base.totals.total_payment - total_payment),
        }
    }
}

/// Build the schedule that replays are measured against.
///
/// Replays never apply monetary correction, so a corrected base would make
/// every replay look cheaper. When a correction rate is set the reference is
/// rebuilt without it and the corrected totals are returned for display.
pub(crate) fn replay_reference(
    system: AmortizationSystem,
    inputs: &ValidatedInputs,
    warnings: &mut Vec<String>,
) -> AmortizationResult<(Schedule, Option<Totals>)> {
    if inputs.monthly_correction_rate <= Decimal::ZERO {
        return Ok((build_schedule(system, inputs)?, None));
    }

    let corrected = build_schedule(system, inputs)?;
    let mut uncorrected_inputs = inputs.clone();
    uncorrected_inputs.monthly_correction_rate = Decimal::ZERO;
    let reference = build_schedule(system, &uncorrected_inputs)?;

    warn!(
        correction_rate = %inputs.monthly_correction_rate,
        "replay measured against uncorrected schedule"
    );
    warnings.push(
        "Monetary correction is not applied when replaying payments; savings are measured \
         against the schedule without correction"
            .into(),
    );
    Ok((reference, Some(corrected.totals)))
}
