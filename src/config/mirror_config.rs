//! Mirror configuration
//!
//! Assembled once at startup from the workflow environment (connection
//! settings and credentials), the CLI (trigger inputs) and an optional YAML
//! mapping file (how GitHub items are rendered on the Jira side).

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Prefix on `JIRA_PASS` selecting bearer-token authentication
const TOKEN_PREFIX: &str = "token:";

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// How the Jira client authenticates
#[derive(Clone, PartialEq, Eq)]
pub enum JiraAuth {
    /// Personal access token, sent as a bearer token
    Token(String),
    /// Username and password (or Cloud API token)
    Basic { user: String, password: String },
}

impl fmt::Debug for JiraAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JiraAuth::Token(_) => f.write_str("Token(<redacted>)"),
            JiraAuth::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Jira connection settings
#[derive(Debug, Clone)]
pub struct JiraIntegration {
    /// Jira instance URL
    pub url: String,

    /// Jira project key mirrored issues are created in
    pub project: String,

    pub auth: JiraAuth,
}

/// GitHub connection settings
#[derive(Clone)]
pub struct GitHubIntegration {
    /// `owner/name` of the repository being mirrored
    pub repository: String,

    /// REST API root (e.g., "https://api.github.com" or "https://ghe.example.com/api/v3")
    pub api_url: String,

    pub graphql_url: String,

    pub token: Option<String>,
}

impl fmt::Debug for GitHubIntegration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubIntegration")
            .field("repository", &self.repository)
            .field("api_url", &self.api_url)
            .field("graphql_url", &self.graphql_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GitHubIntegration {
    /// Split `owner/name`
    pub fn owner_and_name(&self) -> Option<(&str, &str)> {
        self.repository
            .split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
    }
}

/// How GitHub items are represented in Jira
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraMapping {
    /// Issue type for newly created mirrors
    #[serde(default = "default_issue_type")]
    pub issue_type: String,

    /// Labels kept on every mirrored issue in addition to the GitHub labels
    #[serde(default)]
    pub extra_labels: Vec<String>,

    /// Preferred target status when a GitHub item is closed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_status: Option<String>,

    /// Preferred target status when a GitHub item is reopened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reopen_status: Option<String>,

    /// Append linked Jira keys to pull request titles
    #[serde(default = "default_link_pr_titles")]
    pub link_pr_titles: bool,
}

fn default_issue_type() -> String {
    "Task".to_string()
}

fn default_link_pr_titles() -> bool {
    true
}

impl Default for JiraMapping {
    fn default() -> Self {
        Self {
            issue_type: default_issue_type(),
            extra_labels: Vec::new(),
            close_status: None,
            reopen_status: None,
            link_pr_titles: default_link_pr_titles(),
        }
    }
}

impl JiraMapping {
    /// Load a mapping file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::MirrorError::Config(format!(
                "Mapping file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading Jira mapping");

        let content = fs::read_to_string(path)?;
        let mapping: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            issue_type = %mapping.issue_type,
            extra_labels = mapping.extra_labels.len(),
            "Mapping loaded successfully"
        );

        Ok(mapping)
    }
}

/// Per-invocation sync switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Only items carrying this label are mirrored
    pub sync_label: Option<String>,

    /// Run the reconciliation sweep instead of handling a webhook event
    pub cron_job: bool,
}

impl SyncOptions {
    pub fn new(sync_label: Option<String>, cron_job: bool) -> Self {
        Self {
            sync_label: sync_label
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            cron_job,
        }
    }
}

/// Complete configuration of one invocation
#[derive(Debug, Clone, Default)]
pub struct MirrorConfig {
    /// `None` when the process is not running inside a GitHub workflow
    pub github: Option<GitHubIntegration>,

    /// `None` when no Jira URL is configured
    pub jira: Option<JiraIntegration>,

    pub mapping: JiraMapping,

    pub sync: SyncOptions,
}

impl MirrorConfig {
    /// Read connection settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read connection settings through `lookup`
    ///
    /// A missing `GITHUB_REPOSITORY` or `JIRA_URL` is not an error: the
    /// corresponding integration is left unset and the run does nothing.
    /// Outside a GitHub workflow the Jira settings are not read at all;
    /// inside one, a Jira URL without credentials or project is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let github = get("GITHUB_REPOSITORY").map(|repository| {
            let api_url = get("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string())
                .trim_end_matches('/')
                .to_string();
            let graphql_url = get("GITHUB_GRAPHQL_URL")
                .unwrap_or_else(|| format!("{}/graphql", api_url));
            GitHubIntegration {
                repository,
                api_url,
                graphql_url,
                token: get("GITHUB_TOKEN"),
            }
        });

        let jira = match get("JIRA_URL").filter(|_| github.is_some()) {
            None => None,
            Some(url) => {
                let project = get("JIRA_PROJECT").ok_or_else(|| {
                    crate::MirrorError::Config("JIRA_PROJECT is required when JIRA_URL is set".into())
                })?;
                let pass = get("JIRA_PASS").ok_or_else(|| {
                    crate::MirrorError::Config("JIRA_PASS is required when JIRA_URL is set".into())
                })?;
                let auth = match pass.strip_prefix(TOKEN_PREFIX) {
                    Some(token) => JiraAuth::Token(token.to_string()),
                    None => JiraAuth::Basic {
                        user: get("JIRA_USER").ok_or_else(|| {
                            crate::MirrorError::Config(
                                "JIRA_USER is required for password authentication".into(),
                            )
                        })?,
                        password: pass,
                    },
                };
                Some(JiraIntegration { url, project, auth })
            }
        };

        Ok(Self {
            github,
            jira,
            mapping: JiraMapping::default(),
            sync: SyncOptions::default(),
        })
    }

    pub fn with_mapping(mut self, mapping: JiraMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_sync(mut self, sync: SyncOptions) -> Self {
        self.sync = sync;
        self
    }
}
