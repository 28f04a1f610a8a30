use clap::Args;
use serde_json::Value;

use fundsim_core::time_value::{self, IrrInput};

use crate::input;

/// Arguments for the IRR solver
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON input file ({"cash_flows": [...]})
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let irr_input: IrrInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for the IRR solver".into());
    };
    let result = time_value::solve_irr(&irr_input)?;
    Ok(serde_json::to_value(result)?)
}
