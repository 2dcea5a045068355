use clap::Args;
use serde_json::Value;

use amortization_core::analysis::compare::{self, ComparisonInput};

use crate::commands::schedule::LoanFlags;
use crate::config::Settings;
use crate::input;

/// Arguments for the system comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub loan: LoanFlags,
}

pub fn run_compare(args: CompareArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let mut comparison_input: ComparisonInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        ComparisonInput {
            inputs: args.loan.to_inputs()?,
            max_income_commitment: None,
        }
    };
    comparison_input
        .max_income_commitment
        .get_or_insert(settings.max_income_commitment);

    let result = compare::analyze_comparison(&comparison_input)?;
    Ok(serde_json::to_value(result)?)
}
