use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use amortization_core::inputs::validate::ValidatedInputs;
use amortization_core::schedule::{self, AmortizationSystem, ScheduleInput};

use crate::config::Settings;
use crate::input;

/// Amortization system selectable from the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SystemArg {
    /// Declining balance (constant amortization)
    Sac,
    /// Constant installment
    Price,
}

impl From<SystemArg> for AmortizationSystem {
    fn from(arg: SystemArg) -> Self {
        match arg {
            SystemArg::Sac => AmortizationSystem::DecliningBalance,
            SystemArg::Price => AmortizationSystem::ConstantInstallment,
        }
    }
}

/// Loan terms shared by the flag-driven commands
#[derive(Args)]
pub struct LoanFlags {
    /// Financed amount
    #[arg(long, alias = "pv")]
    pub principal: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Monthly interest rate as a decimal (0.01 = 1%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Monthly monetary correction as a decimal
    #[arg(long, default_value = "0")]
    pub correction: Decimal,

    /// Total gross monthly income, for the affordability check
    #[arg(long, default_value = "0")]
    pub gross_income: Decimal,
}

impl LoanFlags {
    pub fn to_inputs(&self) -> Result<ValidatedInputs, Box<dyn std::error::Error>> {
        let mut inputs = ValidatedInputs::new(
            self.principal.ok_or("--principal is required (or provide --input)")?,
            self.term.ok_or("--term is required (or provide --input)")?,
            self.rate.ok_or("--rate is required (or provide --input)")?,
        );
        inputs.monthly_correction_rate = self.correction;
        inputs.total_gross_income = self.gross_income;
        Ok(inputs)
    }
}

/// Arguments for building a single schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub loan: LoanFlags,

    /// Amortization system
    #[arg(long, value_enum, default_value = "sac")]
    pub system: SystemArg,
}

pub fn run_schedule(args: ScheduleArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let mut schedule_input: ScheduleInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        ScheduleInput {
            inputs: args.loan.to_inputs()?,
            system: args.system.into(),
            max_income_commitment: None,
        }
    };
    schedule_input
        .max_income_commitment
        .get_or_insert(settings.max_income_commitment);

    let result = schedule::analyze_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
