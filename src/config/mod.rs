//! Configuration system
//!
//! One [`MirrorConfig`] is built per invocation and passed by reference to
//! every component. It combines:
//! - Connection settings and credentials from the workflow environment
//! - Sync switches (cron sweep, sync label) from the CLI
//! - The Jira field mapping from an optional YAML file

mod mirror_config;
pub mod validation;

pub use mirror_config::{
    GitHubIntegration, JiraAuth, JiraIntegration, JiraMapping, MirrorConfig, SyncOptions,
};
pub use validation::{validate_config, validate_config_result, ValidationError};
