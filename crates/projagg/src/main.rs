//! projagg - Project Aggregator CLI
//!
//! Keeps a Visual Studio solution in step with the project files on disk.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod commands;
mod config;
mod console;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("projagg=info".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load()?;

    // Execute command
    match cli.command {
        Commands::Aggregate(cmd) => commands::aggregate::execute(cmd, &config).await,
        Commands::Missing { target, json } => commands::missing::execute(&target, json).await,
        Commands::Doctor => commands::doctor::execute(&config).await,
        Commands::Version => {
            println!("projagg {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
