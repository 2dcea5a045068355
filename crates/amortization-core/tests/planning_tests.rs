use amortization_core::analysis::planning::{
    analyze_planning, simulate_planning, PlanningInput, PlanningState, ToggleOutcome,
};
use amortization_core::analysis::ExtraPolicy;
use amortization_core::inputs::validate::ValidatedInputs;
use amortization_core::schedule::{build_schedule, AmortizationSystem, Schedule};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn base(system: AmortizationSystem, principal: Decimal, term: u32) -> Schedule {
    build_schedule(system, &ValidatedInputs::new(principal, term, dec!(0.01))).unwrap()
}

#[test]
fn test_planning_reduce_term_declining() {
    let base = base(AmortizationSystem::DecliningBalance, dec!(120_000), 12);
    let state = PlanningState::from_parts(3, [10, 11, 12], ExtraPolicy::ReduceTerm);
    let result = simulate_planning(&base, &state).unwrap();

    let months: Vec<u32> = result.modified.periods.iter().map(|p| p.month).collect();
    assert_eq!(months, vec![4, 5, 6, 7, 8, 9]);
    assert_eq!(result.savings.interest_saved, dec!(2400.00));
    assert_eq!(result.savings.term_reduction, 3);
    assert_eq!(result.modified.totals.total_interest, dec!(5400.00));
    assert_eq!(result.modified.totals.total_payment, dec!(125_400.00));
}

#[test]
fn test_planning_reduce_installment_declining() {
    let base = base(AmortizationSystem::DecliningBalance, dec!(100_000), 10);
    let state = PlanningState::from_parts(2, [9, 10], ExtraPolicy::ReduceInstallment);
    let result = simulate_planning(&base, &state).unwrap();

    assert_eq!(result.new_balance, dec!(60_000.00));
    assert_eq!(result.remaining_periods, 8);
    assert_eq!(result.modified.periods[0].month, 3);
    assert_eq!(result.modified.periods[0].amortization, dec!(7500.00));
    assert_eq!(result.modified.totals.total_interest, dec!(4600.00));
    assert_eq!(result.modified.totals.total_payment, dec!(104_600.00));
    assert_eq!(result.savings.interest_saved, dec!(900.00));
    assert_eq!(result.savings.term_reduction, 0);
}

#[test]
fn test_planning_reduce_term_constant_installment() {
    let base = base(AmortizationSystem::ConstantInstallment, dec!(10_000), 12);
    let state = PlanningState::from_parts(3, [12], ExtraPolicy::ReduceTerm);
    let result = simulate_planning(&base, &state).unwrap();

    assert_eq!(result.remaining_periods, 8);
    assert_eq!(result.savings.term_reduction, 1);
    assert!(result.savings.interest_saved > Decimal::ZERO);
    assert_eq!(result.modified.periods.last().unwrap().month, 11);
    assert_eq!(result.modified.periods.last().unwrap().balance, Decimal::ZERO);
}

#[test]
fn test_planning_untouched_state_reproduces_base_term() {
    let base = base(AmortizationSystem::DecliningBalance, dec!(100_000), 120);
    let state = PlanningState::new(ExtraPolicy::ReduceTerm);
    let result = simulate_planning(&base, &state).unwrap();

    assert_eq!(result.remaining_periods, 120);
    assert_eq!(result.savings.term_reduction, 0);
}

#[test]
fn test_planning_fully_paid() {
    let base = base(AmortizationSystem::DecliningBalance, dec!(100_000), 10);
    let state = PlanningState::from_parts(10, [], ExtraPolicy::ReduceTerm);
    let result = simulate_planning(&base, &state).unwrap();

    assert!(result.modified.is_paid_off());
    assert_eq!(result.new_balance, Decimal::ZERO);
    assert_eq!(result.remaining_periods, 0);
    assert_eq!(result.modified.totals.total_interest, base.totals.total_interest);
    assert_eq!(result.savings.total_saved, Decimal::ZERO);
}

#[test]
fn test_absorption_walkthrough() {
    let mut state = PlanningState::from_parts(10, [], ExtraPolicy::ReduceTerm);
    assert_eq!(state.toggle(12), ToggleOutcome::ExtraAdded);
    assert_eq!(state.toggle(13), ToggleOutcome::ExtraAdded);
    assert_eq!(state.toggle(11), ToggleOutcome::SequentialPaid);
    assert_eq!(state.watermark(), 13);
    assert!(state.extra_months().is_empty());

    assert_eq!(state.toggle(13), ToggleOutcome::SequentialUndone);
    assert_eq!(state.watermark(), 12);
}

#[test]
fn test_analyze_planning_round_trips_state() {
    let out = analyze_planning(&PlanningInput {
        inputs: ValidatedInputs::new(dec!(120_000), 12, dec!(0.01)),
        system: AmortizationSystem::DecliningBalance,
        policy: ExtraPolicy::ReduceTerm,
        paid_up_to_month: 3,
        extra_paid_months: vec![10, 11, 12],
        toggles: Vec::new(),
    })
    .unwrap();

    let json = serde_json::to_string(&out.result.state).unwrap();
    let restored: PlanningState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, out.result.state);
    assert_eq!(out.result.result.savings.interest_saved, dec!(2400.00));
    assert!(out.warnings.is_empty());
}

#[test]
fn test_analyze_planning_with_correction_reports_no_savings_when_nothing_paid() {
    for system in [AmortizationSystem::DecliningBalance, AmortizationSystem::ConstantInstallment] {
        let mut inputs = ValidatedInputs::new(dec!(300_000), 360, dec!(0.0079));
        inputs.monthly_correction_rate = dec!(0.001);
        let out = analyze_planning(&PlanningInput {
            inputs,
            system,
            policy: ExtraPolicy::ReduceTerm,
            paid_up_to_month: 0,
            extra_paid_months: Vec::new(),
            toggles: Vec::new(),
        })
        .unwrap();

        let savings = &out.result.result.savings;
        assert_eq!(savings.interest_saved, Decimal::ZERO, "{system:?}");
        assert_eq!(savings.total_saved, Decimal::ZERO, "{system:?}");
        assert_eq!(savings.term_reduction, 0);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("Monetary correction is not applied"));

        let corrected = out.result.corrected_base_totals.as_ref().unwrap();
        assert!(corrected.total_interest > out.result.base_totals.total_interest);
    }
}

#[test]
fn test_analyze_planning_with_correction_matches_uncorrected_replay() {
    let request = |correction: Decimal| {
        let mut inputs = ValidatedInputs::new(dec!(120_000), 12, dec!(0.01));
        inputs.monthly_correction_rate = correction;
        analyze_planning(&PlanningInput {
            inputs,
            system: AmortizationSystem::DecliningBalance,
            policy: ExtraPolicy::ReduceTerm,
            paid_up_to_month: 3,
            extra_paid_months: vec![10, 11, 12],
            toggles: Vec::new(),
        })
        .unwrap()
    };

    let corrected = request(dec!(0.002));
    let plain = request(Decimal::ZERO);
    assert_eq!(corrected.result.result, plain.result.result);
    assert_eq!(corrected.result.base_totals, plain.result.base_totals);
    assert_eq!(corrected.result.result.savings.interest_saved, dec!(2400.00));
    assert!(plain.result.corrected_base_totals.is_none());
    assert!(plain.warnings.is_empty());
}
