use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use amortization_core::inputs::validate::{self, RawInputs};
use amortization_core::AmortizationError;

use crate::input;

/// Arguments for input validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Property value
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Down payment as a percentage of the property value
    #[arg(long, alias = "down")]
    pub down_payment_pct: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Annual interest rate in percent
    #[arg(long, alias = "annual-rate")]
    pub annual_interest_rate_pct: Option<Decimal>,

    /// Gross monthly income
    #[arg(long)]
    pub gross_income: Option<Decimal>,

    /// Net monthly income
    #[arg(long)]
    pub net_income: Option<Decimal>,

    /// Earmarked-fund balance available
    #[arg(long, default_value = "0")]
    pub earmarked_balance: Decimal,

    /// Co-borrower gross monthly income
    #[arg(long, default_value = "0")]
    pub co_borrower_income: Decimal,

    /// Monthly monetary correction in percent
    #[arg(long, default_value = "0")]
    pub correction_pct: Decimal,
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw: RawInputs = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        RawInputs {
            property_value: args.property_value
                .ok_or("--property-value is required (or provide --input)")?,
            down_payment_pct: args.down_payment_pct
                .ok_or("--down-payment-pct is required (or provide --input)")?,
            term_months: args.term
                .ok_or("--term is required (or provide --input)")?,
            annual_interest_rate_pct: args.annual_interest_rate_pct
                .ok_or("--annual-interest-rate-pct is required (or provide --input)")?,
            gross_monthly_income: args.gross_income
                .ok_or("--gross-income is required (or provide --input)")?,
            net_monthly_income: args.net_income
                .ok_or("--net-income is required (or provide --input)")?,
            earmarked_balance: args.earmarked_balance,
            co_borrower_income: args.co_borrower_income,
            monthly_correction_pct: args.correction_pct,
        }
    };

    match validate::validate_inputs(&raw) {
        Ok(inputs) => Ok(serde_json::json!({ "valid": true, "result": inputs })),
        Err(AmortizationError::Validation(errors)) => {
            Ok(serde_json::json!({ "valid": false, "result": { "errors": errors } }))
        }
        Err(e) => Err(e.into()),
    }
}
