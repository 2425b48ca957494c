use std::path::PathBuf;

use clap::{Args, Subcommand};
use schemaport_core::bicep;
use tracing::debug;

use crate::cli::{print_code, print_schema, read_schema, run_cli};

#[derive(Subcommand, Debug, Clone)]
pub enum BicepCommands {
    /// Generate a JSON schema from a Bicep template or ARM JSON
    Input(InputArgs),
    /// Generate Bicep parameters from a JSON schema
    Output(OutputArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to a `.bicep` file or an ARM template (`.json`)
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Path to a JSON schema, or `-` for stdin
    pub path: PathBuf,
}

pub fn run(command: BicepCommands) -> i32 {
    run_cli(|| match command {
        BicepCommands::Input(args) => {
            debug!(path = %args.path.display(), "bicep input");
            print_schema(&bicep::bicep_to_schema(&args.path))
        }
        BicepCommands::Output(args) => {
            debug!(path = %args.path.display(), "bicep output");
            let schema = read_schema(&args.path)?;
            let result = bicep::schema_to_bicep(&schema).map_err(|e| e.to_string())?;
            print_code(&result)
        }
    })
}
