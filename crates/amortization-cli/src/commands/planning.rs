use clap::Args;
use serde_json::Value;

use amortization_core::analysis::planning::{self, PlanningInput};

use crate::input;

#[derive(Args)]
pub struct PlanningArgs {
    #[arg(long)]
    pub input: Option<String>,

    /// Months to toggle after restoring the input state, in order
    #[arg(long, value_delimiter = ',')]
    pub toggle: Vec<u32>,
}

pub fn run_planning(args: PlanningArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut planning_input: PlanningInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for payment planning".into());
    };
    planning_input.toggles.extend(args.toggle);

    let result = planning::analyze_planning(&planning_input)?;
    Ok(serde_json::to_value(result)?)
}
