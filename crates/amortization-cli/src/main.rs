mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use commands::compare::CompareArgs;
use commands::extra::ExtraArgs;
use commands::planning::PlanningArgs;
use commands::presets::PresetsArgs;
use commands::schedule::ScheduleArgs;
use commands::validate::ValidateArgs;
use config::Settings;

/// Loan amortization schedules and extra-payment planning
#[derive(Parser)]
#[command(
    name = "amort",
    version,
    about = "Loan amortization schedules and extra-payment planning",
    long_about = "A CLI for building declining-balance (SAC) and constant-installment (Price) \
                  amortization schedules with decimal precision. Supports side-by-side \
                  comparison, extra-payment simulation and month-by-month payment planning."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// YAML settings file (defaults to $AMORT_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate raw loan inputs and derive the financed amount and monthly rate
    Validate(ValidateArgs),
    /// Build a declining-balance or constant-installment schedule
    Schedule(ScheduleArgs),
    /// Compare both amortization systems for the same loan
    Compare(CompareArgs),
    /// Simulate one-time and recurring extra payments
    Extra(ExtraArgs),
    /// Replay paid months and re-derive the remaining schedule
    Planning(PlanningArgs),
    /// List or reset the stored bank rate presets
    Presets(PresetsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("amortization_core={0},amort={0}", settings.log_level).into()
    });

    let fmt_layer = if settings.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    init_tracing(&settings);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Validate(args) => commands::validate::run_validate(args),
        Commands::Schedule(args) => commands::schedule::run_schedule(args, &settings),
        Commands::Compare(args) => commands::compare::run_compare(args, &settings),
        Commands::Extra(args) => commands::extra::run_extra(args),
        Commands::Planning(args) => commands::planning::run_planning(args),
        Commands::Presets(args) => commands::presets::run_presets(args, &settings),
        Commands::Version => {
            println!("amort {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
