use clap::Args;
use serde_json::Value;

use amortization_core::analysis::extra_amortization::{self, ExtraAmortizationInput};

use crate::input;

#[derive(Args)]
pub struct ExtraArgs {
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_extra(args: ExtraArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let extra_input: ExtraAmortizationInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for extra-payment simulation".into());
    };
    let result = extra_amortization::analyze_extra_amortization(&extra_input)?;
    Ok(serde_json::to_value(result)?)
}
