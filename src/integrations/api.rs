//! Capability traits for the two systems of record
//!
//! The mirror core only talks to Jira and GitHub through these traits.
//! [`JiraAdapter`](super::JiraAdapter) and [`GitHubAdapter`](super::GitHubAdapter)
//! implement them over HTTP; tests implement them in memory.

use super::jira::{JiraComment, JiraIssue, JiraSearchResponse, JiraTransition, NewJiraIssue};
use crate::model::{ClosingIssueRef, GitHubItemDescriptor};
use crate::Result;
use async_trait::async_trait;

/// Operations the mirror needs from Jira
#[async_trait]
pub trait JiraApi: Send + Sync {
    /// One page of a JQL search, starting at result `start_at`
    async fn search(
        &self,
        jql: &str,
        start_at: u32,
        max_results: u32,
    ) -> Result<JiraSearchResponse>;

    /// Create an issue in the configured project
    async fn create_issue(&self, issue: &NewJiraIssue) -> Result<JiraIssue>;

    /// Overwrite summary and description
    async fn update_issue(&self, key: &str, summary: &str, description: &str) -> Result<()>;

    /// Add and remove labels in one update
    async fn set_labels(&self, key: &str, add: &[String], remove: &[String]) -> Result<()>;

    /// Attach a remote link; repeated calls with the same `url` update the link
    async fn add_remote_link(&self, key: &str, url: &str, title: &str) -> Result<()>;

    async fn get_comments(&self, key: &str) -> Result<Vec<JiraComment>>;

    async fn add_comment(&self, key: &str, body: &str) -> Result<JiraComment>;

    async fn update_comment(&self, key: &str, comment_id: &str, body: &str) -> Result<()>;

    async fn delete_comment(&self, key: &str, comment_id: &str) -> Result<()>;

    /// Transitions currently available for an issue
    async fn get_transitions(&self, key: &str) -> Result<Vec<JiraTransition>>;

    async fn transition_status(&self, key: &str, transition_id: &str) -> Result<()>;
}

/// Operations the mirror needs from GitHub, scoped to one repository
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn is_collaborator(&self, login: &str) -> Result<bool>;

    /// All open pull requests, newest first
    async fn list_open_pulls(&self) -> Result<Vec<GitHubItemDescriptor>>;

    /// Fetch an issue or pull request by number
    async fn get_item(&self, number: u64) -> Result<GitHubItemDescriptor>;

    /// Issues the pull request will close (at most 10)
    async fn closing_issues(&self, pr_number: u64) -> Result<Vec<ClosingIssueRef>>;

    async fn update_title(&self, number: u64, title: &str) -> Result<()>;
}
