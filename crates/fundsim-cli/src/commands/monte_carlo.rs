use clap::Args;
use serde_json::Value;

use fundsim_core::monte_carlo::prng::Lcg32;
use fundsim_core::monte_carlo::simulation::{self, FundParams, MonteCarloInput};

use crate::input;

/// Arguments for the full Monte Carlo study
#[derive(Args)]
pub struct MonteCarloArgs {
    /// Path to JSON input file; an empty object runs the reference fund
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a single fund realization
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON fund-parameter file; defaults apply when omitted
    #[arg(long)]
    pub input: Option<String>,
    /// Seed for the random stream
    #[arg(long)]
    pub seed: i64,
}

pub fn run_monte_carlo(args: MonteCarloArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mc_input: MonteCarloInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for the Monte Carlo study".into());
    };
    let result = simulation::run_monte_carlo(&mc_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: FundParams = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        FundParams::default()
    };
    simulation::validate_params(&params)?;

    let mut rng = Lcg32::new(args.seed);
    let result = simulation::simulate_once(&params, &mut rng);
    Ok(serde_json::to_value(result)?)
}
