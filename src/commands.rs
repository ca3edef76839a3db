//! CLI definition and the top-level run
//!
//! Flags fall back to the variables GitHub Actions sets, so the binary runs
//! unchanged as a workflow step.

use crate::config::{validate_config_result, JiraMapping, MirrorConfig, SyncOptions};
use crate::integrations::{GitHubAdapter, JiraAdapter};
use crate::mirror::{classify, EventOutcome, Mirror, SweepReport};
use crate::{MirrorError, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Mirror GitHub issues and pull requests into Jira
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "jira-mirror")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// YAML file describing how items are rendered in Jira
    #[arg(long, env = "JIRA_MIRROR_MAPPING")]
    pub mapping: Option<PathBuf>,

    /// Name of the triggering webhook event
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    pub event_name: Option<String>,

    /// Path of the JSON file holding the webhook payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: Option<PathBuf>,

    /// Run the reconciliation sweep over open pull requests
    #[arg(
        long,
        env = "INPUT_CRON_JOB",
        action = clap::ArgAction::Set,
        value_parser = parse_flag,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub cron: bool,

    /// Only mirror items carrying this label
    #[arg(long, env = "INPUT_SYNC_LABEL")]
    pub sync_label: Option<String>,
}

/// Workflow inputs arrive as strings; any non-empty value other than an
/// explicit false enables the flag.
fn parse_flag(value: &str) -> std::result::Result<bool, String> {
    let value = value.trim();
    Ok(!(value.is_empty()
        || value == "0"
        || value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("no")))
}

impl Cli {
    /// Sync switches carried by the CLI
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions::new(self.sync_label.clone(), self.cron)
    }

    pub fn invocation(&self) -> Invocation {
        Invocation {
            event_name: self.event_name.clone(),
            event_path: self.event_path.clone(),
        }
    }

    /// Environment settings plus mapping file plus sync switches
    pub fn load_config(&self) -> Result<MirrorConfig> {
        let mapping = match self.mapping {
            Some(ref path) => JiraMapping::load(path)?,
            None => JiraMapping::default(),
        };
        Ok(MirrorConfig::from_env()?
            .with_mapping(mapping)
            .with_sync(self.sync_options()))
    }
}

/// Which webhook event to handle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub event_name: Option<String>,
    pub event_path: Option<PathBuf>,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Not configured for mirroring; nothing was touched
    Skipped(String),
    Swept(SweepReport),
    Processed(Vec<EventOutcome>),
}

/// Run one invocation against the live Jira and GitHub APIs
pub async fn run_mirror(config: &MirrorConfig, invocation: &Invocation) -> Result<RunOutcome> {
    let Some(ref github_config) = config.github else {
        let reason = "Not running in GitHub Actions context, nothing to do".to_string();
        info!("{}", reason);
        return Ok(RunOutcome::Skipped(reason));
    };
    let Some(ref jira_config) = config.jira else {
        let reason = "No Jira URL configured, nothing to do".to_string();
        info!("{}", reason);
        return Ok(RunOutcome::Skipped(reason));
    };

    validate_config_result(config)?;

    info!(url = %jira_config.url, project = %jira_config.project, "Connecting to Jira");
    let jira = JiraAdapter::new(jira_config)?;
    let github = GitHubAdapter::new(github_config)?;
    let mirror = Mirror::new(config, &jira, &github)?;

    if config.sync.cron_job {
        info!("Running as a cron job, syncing remaining pull requests");
        return Ok(RunOutcome::Swept(mirror.sync_remain_prs().await?));
    }

    let event_name = invocation
        .event_name
        .as_deref()
        .ok_or_else(|| MirrorError::Config("GITHUB_EVENT_NAME is not set".to_string()))?;
    let event_path = invocation
        .event_path
        .as_deref()
        .ok_or_else(|| MirrorError::Config("GITHUB_EVENT_PATH is not set".to_string()))?;

    let payload = read_event(event_path)?;
    let trigger = classify(event_name, &payload)?;
    Ok(RunOutcome::Processed(mirror.process(trigger).await?))
}

/// Load the webhook payload
pub fn read_event(path: &Path) -> Result<serde_json::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        MirrorError::Config(format!("Cannot read event file {}: {}", path.display(), e))
    })?;
    let payload: serde_json::Value = serde_json::from_str(&content)?;
    debug!(payload = %payload, "Webhook payload");
    Ok(payload)
}
