//! Error types for jira-mirror
//!
//! A single error enum covers every failure mode of an invocation. Handlers
//! propagate these to `main`, which reports them and exits non-zero so the
//! workflow run is marked failed.

use thiserror::Error;

/// Result type alias for jira-mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Error type for jira-mirror operations
#[derive(Error, Debug)]
pub enum MirrorError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed webhook payloads or manual inputs
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Jira or GitHub answered with an error
    #[error("Integration error: {0}")]
    Integration(String),

    /// More than one Jira issue claims to mirror the same GitHub item
    #[error("Multiple Jira issues reference {url}: {}", keys.join(", "))]
    AmbiguousMirror { url: String, keys: Vec<String> },

    /// Other errors
    #[error("{0}")]
    Other(String),
}
