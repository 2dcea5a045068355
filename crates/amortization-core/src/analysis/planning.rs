//! Interactive payment planning.
//!
//! The user marks real months as paid. Sequential payments advance a
//! watermark; months paid ahead of time are kept as a set of out-of-order
//! extras, each of which prepays that month's scheduled amortization. After
//! every mutation, extras contiguous with the watermark are absorbed into
//! it, so no extra is ever at or below the watermark.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, warn};

use super::{replay_reference, ExtraPolicy, SavingsSummary};
use crate::engines::{generate_constant_periods, generate_declining_periods, solve_remaining_term};
use crate::error::AmortizationError;
use crate::inputs::validate::ValidatedInputs;
use crate::rounding::{round2, sum_rounded};
use crate::schedule::{compute_totals, AmortizationSystem, Schedule, Totals};
use crate::types::*;
use crate::AmortizationResult;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// What a [`PlanningState::toggle`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    SequentialPaid,
    SequentialUndone,
    ExtraAdded,
    ExtraRemoved,
    Ignored,
}

#[derive(Debug, Clone, Deserialize)]
struct PlanningStateRepr {
    #[serde(default)]
    watermark: u32,
    #[serde(default)]
    extra_months: BTreeSet<u32>,
    #[serde(default)]
    policy: ExtraPolicy,
}

/// Paid/unpaid state owned by a single controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PlanningStateRepr")]
pub struct PlanningState {
    watermark: u32,
    extra_months: BTreeSet<u32>,
    policy: ExtraPolicy,
}

impl From<PlanningStateRepr> for PlanningState {
    fn from(repr: PlanningStateRepr) -> Self {
        PlanningState::from_parts(repr.watermark, repr.extra_months, repr.policy)
    }
}

impl PlanningState {
    pub fn new(policy: ExtraPolicy) -> Self {
        PlanningState {
            watermark: 0,
            extra_months: BTreeSet::new(),
            policy,
        }
    }

    /// Restore a state, absorbing any extras contiguous with the watermark.
    pub fn from_parts(
        watermark: u32,
        extra_months: impl IntoIterator<Item = u32>,
        policy: ExtraPolicy,
    ) -> Self {
        let mut state = PlanningState {
            watermark,
            extra_months: extra_months.into_iter().collect(),
            policy,
        };
        state.absorb();
        state
    }

    /// Highest month paid sequentially.
    pub fn watermark(&self) -> u32 {
        self.watermark
    }

    pub fn extra_months(&self) -> &BTreeSet<u32> {
        &self.extra_months
    }

    pub fn policy(&self) -> ExtraPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ExtraPolicy) {
        self.policy = policy;
    }

    pub fn is_paid(&self, month: u32) -> bool {
        (month >= 1 && month <= self.watermark) || self.extra_months.contains(&month)
    }

    /// Flip the paid state of `month`.
    ///
    /// Only the watermark month itself can be un-paid among the sequential
    /// months; earlier ones are ignored.
    pub fn toggle(&mut self, month: u32) -> ToggleOutcome {
        let outcome = if month == 0 {
            ToggleOutcome::Ignored
        } else if month <= self.watermark {
            if month == self.watermark {
                self.watermark -= 1;
                ToggleOutcome::SequentialUndone
            } else {
                ToggleOutcome::Ignored
            }
        } else if self.extra_months.remove(&month) {
            ToggleOutcome::ExtraRemoved
        } else if month == self.watermark + 1 {
            self.watermark += 1;
            ToggleOutcome::SequentialPaid
        } else {
            self.extra_months.insert(month);
            ToggleOutcome::ExtraAdded
        };

        let absorbed = self.absorb();
        debug!(
            month,
            ?outcome,
            absorbed,
            watermark = self.watermark,
            extras = self.extra_months.len(),
            "planning toggle"
        );
        outcome
    }

    /// Fold extras contiguous with the watermark into it. Idempotent.
    fn absorb(&mut self) -> u32 {
        let mut absorbed = 0;
        while self.extra_months.remove(&(self.watermark + 1)) {
            self.watermark += 1;
            absorbed += 1;
        }
        let watermark = self.watermark;
        self.extra_months.retain(|&m| m > watermark);
        absorbed
    }

    /// Whether `month` may be marked paid against `base`.
    ///
    /// The next sequential month always may. Any other unpaid month may only
    /// if the scheduled amortizations of all extras, including this one,
    /// still fit within the balance at the watermark.
    pub fn can_check(&self, month: u32, base: &Schedule) -> bool {
        if month == 0 || month > base.month_count() || self.is_paid(month) {
            return false;
        }
        if month == self.watermark + 1 {
            return true;
        }

        let Ok(balance) = balance_at_watermark(base, self.watermark) else {
            return false;
        };
        let committed: Money = self
            .extra_months
            .iter()
            .chain(std::iter::once(&month))
            .filter_map(|&m| base.period(m))
            .map(|p| p.amortization)
            .sum();

        committed <= balance
    }

    pub fn can_uncheck(&self, month: u32) -> bool {
        (month >= 1 && month == self.watermark) || self.extra_months.contains(&month)
    }

    pub fn simulate(&self, base: &Schedule) -> AmortizationResult<PlanningResult> {
        simulate_planning(base, self)
    }
}

// ---------------------------------------------------------------------------
// Tail re-derivation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningResult {
    /// Remaining schedule, numbered from `watermark + 1`. Empty when the
    /// loan is fully paid off.
    pub modified: Schedule,
    pub savings: SavingsSummary,
    pub balance_at_watermark: Money,
    pub extra_principal: Money,
    pub new_balance: Money,
    pub remaining_periods: u32,
}

/// Outstanding balance after the first `watermark` months of `base`.
pub fn balance_at_watermark(base: &Schedule, watermark: u32) -> AmortizationResult<Money> {
    if watermark == 0 {
        return base.principal().ok_or_else(|| AmortizationError::InvalidInput {
            field: "base_schedule".into(),
            reason: "Base schedule has no periods".into(),
        });
    }
    base.period(watermark)
        .map(|p| p.balance)
        .ok_or_else(|| AmortizationError::InvalidInput {
            field: "watermark".into(),
            reason: format!("Watermark {watermark} is beyond the {}-month schedule", base.month_count()),
        })
}

fn remaining_periods(
    base: &Schedule,
    state: &PlanningState,
    new_balance: Money,
) -> AmortizationResult<u32> {
    let unchanged_term = base.month_count() - state.watermark;
    let solved = match (state.policy, base.system) {
        (ExtraPolicy::ReduceInstallment, _) => return Ok(unchanged_term),
        (ExtraPolicy::ReduceTerm, AmortizationSystem::DecliningBalance) => {
            let original = base.periods[0].amortization;
            if original <= Decimal::ZERO {
                return Err(AmortizationError::DivisionByZero {
                    context: "remaining term from original amortization".into(),
                });
            }
            (new_balance / original)
                .ceil()
                .to_u32()
                .ok_or_else(|| AmortizationError::InvalidInput {
                    field: "remaining_term".into(),
                    reason: "Remaining term is out of range".into(),
                })
        }
        (ExtraPolicy::ReduceTerm, AmortizationSystem::ConstantInstallment) => {
            solve_remaining_term(new_balance, base.periods[0].payment, base.periodic_rate)
        }
    }?;
    // Rounding of the original amortization can push the quotient one past
    // the base horizon; reduce-term never lengthens the loan.
    Ok(solved.min(unchanged_term))
}

/// Re-derive the remaining schedule for a stabilised planning state.
pub fn simulate_planning(base: &Schedule, state: &PlanningState) -> AmortizationResult<PlanningResult> {
    let horizon = base.month_count();
    let watermark = state.watermark;
    let rate = base.periodic_rate;

    let balance_at_watermark = balance_at_watermark(base, watermark)?;

    let mut extra_amortizations = Vec::with_capacity(state.extra_months.len());
    for &month in &state.extra_months {
        let period = base.period(month).ok_or_else(|| AmortizationError::InvalidInput {
            field: "extra_months".into(),
            reason: format!("Month {month} is beyond the {horizon}-month schedule"),
        })?;
        extra_amortizations.push(period.amortization);
    }
    let extra_principal = sum_rounded(extra_amortizations);
    let new_balance = round2(balance_at_watermark - extra_principal).max(Decimal::ZERO);

    let paid = &base.periods[..watermark as usize];
    let paid_payment = sum_rounded(paid.iter().map(|p| p.payment));
    let paid_interest = sum_rounded(paid.iter().map(|p| p.interest));
    let paid_amortization = sum_rounded(paid.iter().map(|p| p.amortization));

    let (tail, remaining) = if new_balance.is_zero() {
        (Vec::new(), 0)
    } else {
        let remaining = remaining_periods(base, state, new_balance)?;
        let mut tail = match base.system {
            AmortizationSystem::DecliningBalance => {
                generate_declining_periods(new_balance, remaining, rate, Decimal::ZERO)?
            }
            AmortizationSystem::ConstantInstallment => {
                generate_constant_periods(new_balance, remaining, rate, Decimal::ZERO)?
            }
        };
        for period in &mut tail {
            period.month += watermark;
        }
        (tail, remaining)
    };

    let tail_totals = compute_totals(&tail);
    let totals = Totals {
        total_payment: round2(paid_payment + extra_principal + tail_totals.total_payment),
        total_interest: round2(paid_interest + tail_totals.total_interest),
        total_amortization: round2(
            paid_amortization + extra_principal + tail_totals.total_amortization,
        ),
        first_payment: tail_totals.first_payment,
        last_payment: tail_totals.last_payment,
    };

    let savings = SavingsSummary::against(
        base,
        totals.total_interest,
        totals.total_payment,
        watermark + remaining,
    );

    debug!(
        watermark,
        extras = state.extra_months.len(),
        %new_balance,
        remaining,
        interest_saved = %savings.interest_saved,
        "planning simulated"
    );

    Ok(PlanningResult {
        modified: Schedule {
            system: base.system,
            periods: tail,
            totals,
            periodic_rate: rate,
            correction_rate: Decimal::ZERO,
        },
        savings,
        balance_at_watermark,
        extra_principal,
        new_balance,
        remaining_periods: remaining,
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningInput {
    pub inputs: ValidatedInputs,
    pub system: AmortizationSystem,
    #[serde(default)]
    pub policy: ExtraPolicy,
    #[serde(default)]
    pub paid_up_to_month: u32,
    #[serde(default)]
    pub extra_paid_months: Vec<u32>,
    /// Months to toggle, in order, after restoring the state above.
    #[serde(default)]
    pub toggles: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningOutput {
    pub state: PlanningState,
    pub base_totals: Totals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_base_totals: Option<Totals>,
    pub base_months: u32,
    pub result: PlanningResult,
    pub rejected_toggles: Vec<u32>,
}

/// Restore a planning state, replay toggles through the check/uncheck
/// guards, then simulate the stabilised state.
pub fn analyze_planning(input: &PlanningInput) -> AmortizationResult<ComputationOutput<PlanningOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (base, corrected_base_totals) =
        replay_reference(input.system, &input.inputs, &mut warnings)?;
    let mut state = PlanningState::from_parts(
        input.paid_up_to_month,
        input.extra_paid_months.iter().copied(),
        input.policy,
    );

    let mut rejected_toggles = Vec::new();
    for &month in &input.toggles {
        let allowed = if state.is_paid(month) {
            state.can_uncheck(month)
        } else {
            state.can_check(month, &base)
        };
        if allowed {
            state.toggle(month);
        } else {
            warn!(month, "planning toggle rejected");
            warnings.push(format!("Month {month} cannot be toggled in the current state"));
            rejected_toggles.push(month);
        }
    }

    let result = simulate_planning(&base, &state)?;

    let output = PlanningOutput {
        state,
        base_totals: base.totals.clone(),
        corrected_base_totals,
        base_months: base.month_count(),
        result,
        rejected_toggles,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Payment Planning (watermark + out-of-order months)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
