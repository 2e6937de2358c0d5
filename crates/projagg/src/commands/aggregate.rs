//! Aggregate command: add missing projects to the solution.

use anyhow::{Context, Result};
use colored::Colorize;
use projagg_core::log::{RunLog, TracingLog};
use projagg_core::{
    AggregateRequest, Aggregator, DotnetHost, ReconcileEngine, ReconcileOutcome, ReconcileReport,
};
use std::sync::Arc;

use crate::cli::AggregateCommand;
use crate::config::Config;
use crate::console::ConsoleLog;

pub async fn execute(cmd: AggregateCommand, config: &Config) -> Result<()> {
    let config = apply_overrides(&cmd, config);
    let host_version = cmd.host_version.unwrap_or(config.host.version);

    let host = Arc::new(DotnetHost::new(config.host.dotnet.clone()));
    // JSON output keeps stdout clean; run lines go to tracing instead
    let log: Arc<dyn RunLog> = if cmd.json {
        Arc::new(TracingLog)
    } else {
        Arc::new(ConsoleLog)
    };

    let aggregator = {
        let log = log.clone();
        let config = config.clone();
        Arc::new(Aggregator::new(log.clone(), move |version| {
            ReconcileEngine::new(host.clone(), log.clone(), config.reconcile_config(version))
        }))
    };

    let request = AggregateRequest::new(&cmd.target.solution, &cmd.target.root)
        .with_host_version(host_version);

    // Run off the main task
    let outcome = {
        let aggregator = aggregator.clone();
        tokio::spawn(async move { aggregator.aggregate(&request).await })
            .await
            .context("Aggregation task panicked")?
            .context("Aggregation failed")?
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match &outcome {
        ReconcileOutcome::UpToDate => {
            println!("{}", "✓ Solution already contains every project".green());
        }
        ReconcileOutcome::Reconciled(report) => print_report(report),
    }

    Ok(())
}

fn apply_overrides(cmd: &AggregateCommand, config: &Config) -> Config {
    let mut config = config.clone();
    if let Some(passes) = cmd.passes {
        config.reconcile.passes = passes;
    }
    if cmd.stop_on_convergence {
        config.reconcile.stop_on_convergence = true;
    }
    if let Some(ref dotnet) = cmd.dotnet {
        config.host.dotnet = dotnet.clone();
    }
    config
}

fn print_report(report: &ReconcileReport) {
    println!();
    println!("{}", "Summary".cyan().bold());
    println!("{}", "─".repeat(50));
    println!("  Solution: {}", report.manifest.display());
    println!("  Host: {} ({})", report.host_version, report.host_version.tag());
    println!("  Passes: {}", report.passes_run);
    println!(
        "  Duration: {:.1}s",
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );
    println!("  Added: {}", report.added.len().to_string().green());
    for member in &report.added {
        println!("    {} {}", "+".green(), member.full_name.display());
    }

    if !report.failed.is_empty() {
        println!("  Failed: {}", report.failed.len().to_string().red());
        for candidate in &report.failed {
            println!("    {} {}", "✗".red(), candidate.full_path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::TargetArgs;
    use projagg_core::HostVersion;

    fn command() -> AggregateCommand {
        AggregateCommand {
            target: TargetArgs {
                solution: "All.sln".into(),
                root: "src".into(),
            },
            host_version: None,
            passes: None,
            stop_on_convergence: false,
            dotnet: None,
            json: false,
        }
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let config = Config::default();
        assert_eq!(apply_overrides(&command(), &config), config);
    }

    #[test]
    fn test_overrides_apply() {
        let cmd = AggregateCommand {
            host_version: Some(HostVersion::VisualStudio2013),
            passes: Some(2),
            stop_on_convergence: true,
            dotnet: Some("/usr/local/bin/dotnet".into()),
            ..command()
        };

        let config = apply_overrides(&cmd, &Config::default());

        assert_eq!(config.reconcile.passes, 2);
        assert!(config.reconcile.stop_on_convergence);
        assert_eq!(config.host.dotnet, "/usr/local/bin/dotnet");
    }
}
