//! Configuration validation
//!
//! Validates a mirror configuration for correctness:
//! - Valid Jira and GitHub URLs
//! - Jira project key shape
//! - `owner/name` repository form
//! - Non-blank mapping values

use super::mirror_config::{
    GitHubIntegration, JiraAuth, JiraIntegration, JiraMapping, MirrorConfig,
};
use crate::MirrorError;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a mirror configuration, collecting every problem
pub fn validate_config(config: &MirrorConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if let Some(ref jira) = config.jira {
        validate_jira(jira, &mut errors);
    }

    if let Some(ref github) = config.github {
        validate_github(github, &mut errors);
    }

    validate_mapping(&config.mapping, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_jira(jira: &JiraIntegration, errors: &mut Vec<ValidationError>) {
    if !is_http_url(&jira.url) {
        errors.push(ValidationError::new(
            "jira.url",
            format!("Invalid Jira URL: {}", jira.url),
        ));
    }

    if !is_valid_project_key(&jira.project) {
        errors.push(ValidationError::new(
            "jira.project",
            format!(
                "Invalid Jira project key '{}': expected uppercase letters, digits or '_', starting with a letter",
                jira.project
            ),
        ));
    }

    match &jira.auth {
        JiraAuth::Token(token) if token.is_empty() => {
            errors.push(ValidationError::new("jira.auth", "Jira token is empty"));
        }
        JiraAuth::Basic { user, .. } if user.trim().is_empty() => {
            errors.push(ValidationError::new("jira.auth", "Jira user is empty"));
        }
        _ => {}
    }
}

fn validate_github(github: &GitHubIntegration, errors: &mut Vec<ValidationError>) {
    if github.owner_and_name().is_none() {
        errors.push(ValidationError::new(
            "github.repository",
            format!(
                "Invalid repository '{}': expected owner/name",
                github.repository
            ),
        ));
    }

    if !is_http_url(&github.api_url) {
        errors.push(ValidationError::new(
            "github.api_url",
            format!("Invalid GitHub API URL: {}", github.api_url),
        ));
    }

    if !is_http_url(&github.graphql_url) {
        errors.push(ValidationError::new(
            "github.graphql_url",
            format!("Invalid GitHub GraphQL URL: {}", github.graphql_url),
        ));
    }

    if github.token.is_none() {
        tracing::warn!("GITHUB_TOKEN not set; GitHub API calls will be unauthenticated");
    }
}

fn validate_mapping(mapping: &JiraMapping, errors: &mut Vec<ValidationError>) {
    if mapping.issue_type.trim().is_empty() {
        errors.push(ValidationError::new(
            "mapping.issue_type",
            "Issue type cannot be empty",
        ));
    }

    for label in &mapping.extra_labels {
        if label.trim().is_empty() || label.chars().any(char::is_whitespace) {
            errors.push(ValidationError::new(
                "mapping.extra_labels",
                format!("Invalid Jira label '{}': labels cannot contain spaces", label),
            ));
        }
    }

    for (field, status) in [
        ("mapping.close_status", &mapping.close_status),
        ("mapping.reopen_status", &mapping.reopen_status),
    ] {
        if status.as_deref().is_some_and(|s| s.trim().is_empty()) {
            errors.push(ValidationError::new(field, "Status name cannot be blank"));
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Jira project keys: an uppercase letter followed by uppercase letters,
/// digits or underscores
fn is_valid_project_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &MirrorConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        MirrorError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}
