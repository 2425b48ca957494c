use std::path::PathBuf;

use clap::{Args, Subcommand};
use schemaport_core::opentofu;
use tracing::debug;

use crate::cli::{print_code, print_schema, read_schema, run_cli};

#[derive(Subcommand, Debug, Clone)]
pub enum OpentofuCommands {
    /// Generate a JSON schema from the variables of a module
    Input(InputArgs),
    /// Generate variable blocks from a JSON schema
    Output(OutputArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the module directory
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Path to a JSON schema, or `-` for stdin
    pub path: PathBuf,
}

pub fn run(command: OpentofuCommands) -> i32 {
    run_cli(|| match command {
        OpentofuCommands::Input(args) => {
            debug!(path = %args.path.display(), "opentofu input");
            print_schema(&opentofu::opentofu_to_schema(&args.path))
        }
        OpentofuCommands::Output(args) => {
            debug!(path = %args.path.display(), "opentofu output");
            let schema = read_schema(&args.path)?;
            let result = opentofu::schema_to_opentofu(&schema).map_err(|e| e.to_string())?;
            print_code(&result)
        }
    })
}
