mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::irr::IrrArgs;
use commands::monte_carlo::{MonteCarloArgs, SimulateArgs};

/// Venture fund Monte Carlo simulator
#[derive(Parser)]
#[command(
    name = "fundsim",
    version,
    about = "Venture fund Monte Carlo simulator",
    long_about = "Models venture fund outcomes under a two-stage check-writing \
                  policy: many small discovery checks, promotion of the top \
                  traction signals into larger conviction checks, and a \
                  follow-on reserve concentrated on the best conviction \
                  companies. Results are bit-reproducible per seed."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full Monte Carlo study over a fund configuration
    MonteCarlo(MonteCarloArgs),
    /// Run a single seeded fund realization
    Simulate(SimulateArgs),
    /// Solve the internal rate of return of a cash-flow series
    Irr(IrrArgs),
    /// Print version information
    Version,
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::MonteCarlo(args) => commands::monte_carlo::run_monte_carlo(args),
        Commands::Simulate(args) => commands::monte_carlo::run_simulate(args),
        Commands::Irr(args) => commands::irr::run_irr(args),
        Commands::Version => {
            println!("fundsim {}", env!("CARGO_PKG_VERSION"));
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
