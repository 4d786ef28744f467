mod commands;
mod config;
mod input;
mod output;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortization::{InstallmentArgs, MaxPrincipalArgs, RatiosArgs};
use commands::evaluate::{AssessArgs, EvaluateArgs};
use commands::policy::PoliciesArgs;
use config::CliConfig;

/// Credit decisions for loan and card applications
#[derive(Parser)]
#[command(
    name = "cde",
    version,
    about = "Credit decisions for loan and card applications",
    long_about = "Evaluates loan and card applications against a product policy catalog \
                  with decimal precision: policy checks, risk scoring and grade-gated \
                  arbitration, plus the underlying amortisation and ratio helpers."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log filter for stderr diagnostics (overrides CDE_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an application and produce a credit decision
    Evaluate(EvaluateArgs),
    /// Run policy checks and risk scoring only
    Assess(AssessArgs),
    /// Level monthly installment for a loan
    Installment(InstallmentArgs),
    /// Largest principal a monthly installment can service
    MaxPrincipal(MaxPrincipalArgs),
    /// FOIR, LTV and DTI ratios
    Ratios(RatiosArgs),
    /// Print the policy catalog
    Policies(PoliciesArgs),
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

fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::load() {
        Ok(config) => config,
        Err(e) => fail(&e),
    };
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    if let Err(e) = telemetry::init(log_level) {
        fail(&e);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run_evaluate(args, &config),
        Commands::Assess(args) => commands::evaluate::run_assess(args, &config),
        Commands::Installment(args) => commands::amortization::run_installment(args),
        Commands::MaxPrincipal(args) => commands::amortization::run_max_principal(args),
        Commands::Ratios(args) => commands::amortization::run_ratios(args),
        Commands::Policies(args) => commands::policy::run_policies(args, &config),
        Commands::Version => {
            println!("cde {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => fail(&*e),
    }
}

fn fail(e: &dyn std::error::Error) -> ! {
    eprintln!("{}: {}", "error".red().bold(), e);
    process::exit(1);
}
