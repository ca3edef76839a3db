//! jira-mirror
//!
//! Main entry point for the jira-mirror CLI.

use clap::Parser;
use jira_mirror::commands::{run_mirror, Cli, RunOutcome};
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    if let Err(e) = jira_mirror::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> jira_mirror::Result<()> {
    let config = cli.load_config()?;
    tracing::debug!(config = ?config, "Configuration loaded");

    match run_mirror(&config, &cli.invocation()).await? {
        RunOutcome::Skipped(_) => {}
        RunOutcome::Swept(report) => {
            tracing::info!(created = report.created, "Sweep complete");
        }
        RunOutcome::Processed(outcomes) => {
            tracing::info!(events = outcomes.len(), "Event processed");
        }
    }
    Ok(())
}
