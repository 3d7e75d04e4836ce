mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::insights::InsightsArgs;
use commands::simulation::{BatchArgs, SimulateArgs};
use config::CliConfig;

/// Consortium credit plan bid simulations
#[derive(Parser)]
#[command(
    name = "consorcio",
    version,
    about = "Consortium credit plan bid simulations",
    long_about = "A CLI for simulating consortium (consórcio) credit plans with decimal \
                  precision. Computes the installment schedule after an early bid (lance), \
                  runs batches of plans, and aggregates logged simulations into insights."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// YAML config file with insurance rates (defaults to $CONSORCIO_CONFIG)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the credit schedule after a bid
    Simulate(SimulateArgs),
    /// Simulate an array of plans
    Batch(BatchArgs),
    /// Aggregate logged simulations (general, per day, per consultant, per team)
    Insights(InsightsArgs),
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
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(2);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulation::run_simulate(args, &config),
        Commands::Batch(args) => commands::simulation::run_batch(args, &config),
        Commands::Insights(args) => commands::insights::run_insights(args, &config),
        Commands::Version => {
            println!("consorcio {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
