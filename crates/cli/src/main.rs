#![forbid(unsafe_code)]

use clap::{CommandFactory, Parser, Subcommand};

mod cli;
mod logging;

#[derive(Parser)]
#[command(
    name = "schemaport",
    version,
    about = "Translate IaC parameter declarations to and from JSON Schema"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Bicep templates and ARM JSON
    #[command(subcommand)]
    Bicep(cli::bicep::BicepCommands),
    /// Helm chart values files
    #[command(subcommand)]
    Helm(cli::helm::HelmCommands),
    /// OpenTofu/Terraform modules
    #[command(subcommand)]
    #[command(visible_aliases = ["tofu", "tf", "terraform"])]
    Opentofu(cli::opentofu::OpentofuCommands),
}

fn main() {
    logging::init_tracing();
    std::process::exit(run(Cli::parse()));
}

fn run(cli: Cli) -> i32 {
    match cli.command {
        Some(Commands::Bicep(command)) => cli::bicep::run(command),
        Some(Commands::Helm(command)) => cli::helm::run(command),
        Some(Commands::Opentofu(command)) => cli::opentofu::run(command),
        None => {
            let mut cmd = Cli::command();
            let _ = cmd.print_help();
            println!();
            0
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_opentofu_aliases() {
        for alias in ["opentofu", "tofu", "tf", "terraform"] {
            let cli = Cli::try_parse_from(["schemaport", alias, "input", "modules/net"]).unwrap();
            assert!(matches!(cli.command, Some(Commands::Opentofu(_))));
        }
    }

    #[test]
    fn test_helm_has_no_output_command() {
        assert!(Cli::try_parse_from(["schemaport", "helm", "output", "-"]).is_err());
    }
}
