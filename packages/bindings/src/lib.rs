use napi::Result as NapiResult;
use napi_derive::napi;
use std::str::FromStr;

use amortization_core::analysis::planning::PlanningState;
use amortization_core::schedule::Schedule;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[napi]
pub fn validate_inputs(input_json: String) -> NapiResult<String> {
    let input: amortization_core::inputs::validate::RawInputs =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        amortization_core::inputs::validate::validate_inputs(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn default_presets() -> NapiResult<String> {
    serde_json::to_string(&amortization_core::inputs::presets::shipped_defaults())
        .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let input: amortization_core::schedule::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization_core::schedule::analyze_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_systems(input_json: String) -> NapiResult<String> {
    let input: amortization_core::analysis::compare::ComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        amortization_core::analysis::compare::analyze_comparison(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Extra payments and planning
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_extra_amortization(input_json: String) -> NapiResult<String> {
    let input: amortization_core::analysis::extra_amortization::ExtraAmortizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        amortization_core::analysis::extra_amortization::analyze_extra_amortization(&input)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn plan_payments(input_json: String) -> NapiResult<String> {
    let input: amortization_core::analysis::planning::PlanningInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization_core::analysis::planning::analyze_planning(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Toggle one month of a planning state against its base schedule.
///
/// Returns `{ state, outcome, allowed }`; a rejected toggle returns the
/// state unchanged.
#[napi]
pub fn toggle_planning_month(state_json: String, base_json: String, month: u32) -> NapiResult<String> {
    let mut state: PlanningState = serde_json::from_str(&state_json).map_err(to_napi_error)?;
    let base: Schedule = serde_json::from_str(&base_json).map_err(to_napi_error)?;

    let allowed = if state.is_paid(month) {
        state.can_uncheck(month)
    } else {
        state.can_check(month, &base)
    };
    let outcome = allowed.then(|| state.toggle(month));

    serde_json::to_string(&serde_json::json!({
        "state": state,
        "outcome": outcome,
        "allowed": allowed,
    }))
    .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

#[napi]
pub fn format_currency(value: String) -> NapiResult<String> {
    let amount = rust_decimal::Decimal::from_str(&value).map_err(to_napi_error)?;
    Ok(amortization_core::format::format_currency(amount))
}

#[napi]
pub fn parse_currency(text: String) -> String {
    amortization_core::format::parse_currency(&text).to_string()
}
