//! External Integrations
//!
//! HTTP adapters for Jira and GitHub, and the capability traits the mirror
//! core is written against.
//!
//! # Built-in Integrations
//!
//! - **Jira**: REST API v2 adapter (plain-text descriptions and comments)
//! - **GitHub**: REST adapter for repository reads/writes plus one GraphQL
//!   query for pull request closing references

mod api;
pub mod github;
pub mod jira;

pub use api::{GitHubApi, JiraApi};

// Jira exports
pub use jira::{
    JiraAdapter, JiraComment, JiraFields, JiraIssue, JiraSearchResponse, JiraStatus,
    JiraStatusCategory, JiraTransition, JiraUser, NewJiraIssue,
};

// GitHub exports
pub use github::GitHubAdapter;
