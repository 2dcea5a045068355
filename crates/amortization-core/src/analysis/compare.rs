use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::AmortizationError;
use crate::inputs::validate::ValidatedInputs;
use crate::rounding::round2;
use crate::schedule::{
    affordability_warning, build_schedule, AmortizationSystem, Schedule, Totals,
    DEFAULT_MAX_INCOME_COMMITMENT,
};
use crate::types::*;
use crate::AmortizationResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub system_a: AmortizationSystem,
    pub system_b: AmortizationSystem,
    pub totals_a: Totals,
    pub totals_b: Totals,
    /// Interest B pays beyond A.
    pub interest_saved: Money,
    /// How much larger A's first payment is than B's.
    pub first_payment_delta: Money,
}

/// Project two already-built schedules side by side.
pub fn compare_schedules(a: &Schedule, b: &Schedule) -> ComparisonResult {
    ComparisonResult {
        system_a: a.system,
        system_b: b.system,
        totals_a: a.totals.clone(),
        totals_b: b.totals.clone(),
        interest_saved: round2(b.totals.total_interest - a.totals.total_interest),
        first_payment_delta: round2(a.totals.first_payment - b.totals.first_payment),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub inputs: ValidatedInputs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_income_commitment: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOutput {
    pub declining: Schedule,
    pub constant: Schedule,
    pub comparison: ComparisonResult,
}

/// Build both schedules from the same inputs and compare declining-balance
/// (A) against constant-installment (B).
pub fn analyze_comparison(
    input: &ComparisonInput,
) -> AmortizationResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let ratio = input
        .max_income_commitment
        .unwrap_or(DEFAULT_MAX_INCOME_COMMITMENT);
    if ratio <= Decimal::ZERO {
        return Err(AmortizationError::InvalidInput {
            field: "max_income_commitment".into(),
            reason: "Income commitment ratio must be positive".into(),
        });
    }

    let declining = build_schedule(AmortizationSystem::DecliningBalance, &input.inputs)?;
    let constant = build_schedule(AmortizationSystem::ConstantInstallment, &input.inputs)?;
    let comparison = compare_schedules(&declining, &constant);

    let highest_first = declining
        .totals
        .first_payment
        .max(constant.totals.first_payment);
    if let Some(w) = affordability_warning(highest_first, input.inputs.total_gross_income, ratio) {
        warnings.push(w);
    }

    let output = ComparisonOutput {
        declining,
        constant,
        comparison,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Declining-Balance vs Constant-Installment Comparison",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn standard_inputs() -> ValidatedInputs {
        ValidatedInputs::new(dec!(400000), 120, dec!(0.007974))
    }

    #[test]
    fn test_declining_saves_interest() {
        let out = analyze_comparison(&ComparisonInput {
            inputs: standard_inputs(),
            max_income_commitment: None,
        })
        .unwrap();
        assert!(out.result.comparison.interest_saved > Decimal::ZERO);
        assert_eq!(out.result.comparison.system_a, AmortizationSystem::DecliningBalance);
    }

    #[test]
    fn test_first_payment_delta_is_a_minus_b() {
        let out = analyze_comparison(&ComparisonInput {
            inputs: standard_inputs(),
            max_income_commitment: None,
        })
        .unwrap();
        let r = &out.result;
        assert_eq!(
            r.comparison.first_payment_delta,
            r.declining.totals.first_payment - r.constant.totals.first_payment
        );
        assert!(r.comparison.first_payment_delta > Decimal::ZERO);
    }

    #[test]
    fn test_projection_is_antisymmetric() {
        let inputs = standard_inputs();
        let a = build_schedule(AmortizationSystem::DecliningBalance, &inputs).unwrap();
        let b = build_schedule(AmortizationSystem::ConstantInstallment, &inputs).unwrap();
        let ab = compare_schedules(&a, &b);
        let ba = compare_schedules(&b, &a);
        assert_eq!(ab.interest_saved, -ba.interest_saved);
        assert_eq!(ab.totals_a, ba.totals_b);
    }

    #[test]
    fn test_affordability_warning_uses_larger_first_payment() {
        let mut inputs = standard_inputs();
        // Declining first payment ~6,522.93 breaches 30% of 20,000
        inputs.total_gross_income = dec!(20000);
        let out = analyze_comparison(&ComparisonInput {
            inputs,
            max_income_commitment: None,
        })
        .unwrap();
        assert_eq!(out.warnings.len(), 1);
    }
}
