//! jira-mirror - Mirror GitHub issues and pull requests into Jira
//!
//! Runs as a GitHub Actions step. Each invocation handles one webhook event
//! (or one reconciliation sweep) and keeps the Jira counterpart of the
//! GitHub item in step: existence, summary and description, labels,
//! comments and open/closed status.
//!
//! # Architecture
//!
//! - **config**: Environment, CLI and mapping-file configuration
//! - **model**: GitHub item descriptor and Jira key types
//! - **integrations**: Jira and GitHub capability traits and HTTP adapters
//! - **mirror**: Classification, gating, dispatch, handlers, linker and sweep
//! - **commands**: CLI definition and the top-level run

pub mod commands;
pub mod config;
pub mod error;
pub mod integrations;
pub mod logging;
pub mod mirror;
pub mod model;

// Re-exports
pub use error::{MirrorError, Result};
