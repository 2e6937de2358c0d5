//! Diagnostics command.

use anyhow::Result;
use colored::Colorize;
use projagg_core::DotnetHost;

use crate::config::Config;

pub async fn execute(config: &Config) -> Result<()> {
    println!("{}", "projagg Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let mut issues = Vec::new();

    // Check dotnet
    print!("  dotnet ({}): ", config.host.dotnet);
    match DotnetHost::new(config.host.dotnet.clone()).check() {
        Ok(path) => println!("{} {}", "✓ installed".green(), path.display()),
        Err(_) => {
            println!("{}", "✗ not found".red());
            issues.push("dotnet CLI is not installed or not on PATH");
        }
    }

    // Check config file
    print!("  Config file: ");
    let config_path = Config::config_path();
    if config_path.exists() {
        println!("{} {}", "✓ exists".green(), config_path.display());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Effective settings
    println!();
    println!("  {}", "Settings:".cyan());
    println!(
        "    Host version: {} ({})",
        config.host.version,
        config.host.version.tag()
    );
    println!("    Passes: {}", config.reconcile.passes);
    println!("    Stop on convergence: {}", config.reconcile.stop_on_convergence);
    println!(
        "    Retries: {} every {}s",
        config.retry.retries, config.retry.delay_secs
    );

    // Summary
    println!();
    if issues.is_empty() {
        println!("{}", "✓ All checks passed".green().bold());
    } else {
        println!("{}", format!("✗ {} issue(s) found:", issues.len()).red().bold());
        for issue in &issues {
            println!("  • {}", issue);
        }
    }

    Ok(())
}
