use std::path::PathBuf;

use clap::{Args, Subcommand};
use schemaport_core::helm;
use tracing::debug;

use crate::cli::{print_schema, run_cli};

#[derive(Subcommand, Debug, Clone)]
pub enum HelmCommands {
    /// Generate a JSON schema from a Helm values file
    Input(InputArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to a values file, usually `values.yaml`
    pub path: PathBuf,
}

pub fn run(command: HelmCommands) -> i32 {
    run_cli(|| match command {
        HelmCommands::Input(args) => {
            debug!(path = %args.path.display(), "helm input");
            print_schema(&helm::helm_to_schema(&args.path))
        }
    })
}
