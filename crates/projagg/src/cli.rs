//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};
use projagg_core::HostVersion;
use std::path::PathBuf;

/// Project Aggregator
///
/// Adds project files found under a folder to a Visual Studio solution.
#[derive(Parser, Debug)]
#[command(name = "projagg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add every project under the root folder that the solution is missing
    Aggregate(AggregateCommand),

    /// Show projects missing from the solution without changing it
    Missing {
        #[command(flatten)]
        target: TargetArgs,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Run diagnostics
    Doctor,

    /// Show version
    Version,
}

/// Solution and folder to reconcile.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Solution file (created if it does not exist)
    #[arg(short, long, env = "PROJAGG_SOLUTION")]
    pub solution: PathBuf,

    /// Folder holding the project files
    #[arg(short, long, env = "PROJAGG_ROOT")]
    pub root: PathBuf,
}

#[derive(Args, Debug)]
pub struct AggregateCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Host version (vs2013, vs2015)
    #[arg(long, env = "PROJAGG_HOST_VERSION", value_parser = parse_host_version)]
    pub host_version: Option<HostVersion>,

    /// Maximum number of add passes
    #[arg(long)]
    pub passes: Option<usize>,

    /// Stop as soon as a pass adds nothing
    #[arg(long)]
    pub stop_on_convergence: bool,

    /// dotnet executable to drive
    #[arg(long, env = "PROJAGG_DOTNET")]
    pub dotnet: Option<String>,

    /// Output the run report as JSON
    #[arg(short, long)]
    pub json: bool,
}

fn parse_host_version(s: &str) -> Result<HostVersion, String> {
    s.parse().map_err(|e: projagg_core::Error| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_aggregate() {
        let cli = Cli::try_parse_from([
            "projagg",
            "aggregate",
            "--solution",
            "All.sln",
            "--root",
            "src",
            "--host-version",
            "vs2013",
            "--passes",
            "3",
            "--stop-on-convergence",
        ])
        .expect("parse");

        match cli.command {
            Commands::Aggregate(cmd) => {
                assert_eq!(cmd.target.solution, PathBuf::from("All.sln"));
                assert_eq!(cmd.target.root, PathBuf::from("src"));
                assert_eq!(cmd.host_version, Some(HostVersion::VisualStudio2013));
                assert_eq!(cmd.passes, Some(3));
                assert!(cmd.stop_on_convergence);
                assert!(cmd.dotnet.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_host_version() {
        let result = Cli::try_parse_from([
            "projagg",
            "aggregate",
            "-s",
            "All.sln",
            "-r",
            "src",
            "--host-version",
            "vs2019",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_missing_json() {
        let cli = Cli::try_parse_from(["projagg", "missing", "-s", "All.sln", "-r", ".", "--json"])
            .expect("parse");
        assert!(matches!(cli.command, Commands::Missing { json: true, .. }));
    }
}
