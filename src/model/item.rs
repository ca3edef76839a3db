//! GitHub item descriptor
//!
//! Issues and pull requests arrive in different payload shapes (the `issue`
//! object of an `issues`/`issue_comment` event, the `pull_request` object of a
//! `pull_request` event, REST list/get responses). All of them are adapted
//! into [`GitHubItemDescriptor`] here, so nothing downstream ever inspects raw
//! JSON to tell issues and pull requests apart.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Open/closed state of an issue or pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

/// Canonical view of a GitHub issue or pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubItemDescriptor {
    /// Issue/PR number, unique within the repository
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub labels: BTreeSet<String>,
    pub author_login: String,
    pub state: ItemState,
    pub is_pull_request: bool,
    /// html_url of the item; the cross-reference stored on the Jira side
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelPayload {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub login: String,
}

/// Fields shared by GitHub's issue and pull request JSON objects
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPayload {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<LabelPayload>,
    pub user: UserPayload,
    pub state: ItemState,
    pub html_url: String,
    /// Present (with any value) on issue objects that are really pull requests
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

/// A comment from an `issue_comment` event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    pub user: CommentAuthor,
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentAuthor {
    pub login: String,
}

impl GitHubItemDescriptor {
    /// Adapt an `issue` object. Issue objects that carry a `pull_request`
    /// key (comment events on PRs, the REST issues endpoint) are PRs.
    pub fn from_issue(payload: ItemPayload) -> Self {
        let is_pull_request = payload.pull_request.is_some();
        Self::from_payload(payload, is_pull_request)
    }

    /// Adapt a `pull_request` object
    pub fn from_pull_request(payload: ItemPayload) -> Self {
        Self::from_payload(payload, true)
    }

    pub fn from_issue_json(value: &serde_json::Value) -> Result<Self> {
        let payload: ItemPayload = serde_json::from_value(value.clone())?;
        Ok(Self::from_issue(payload))
    }

    pub fn from_pull_request_json(value: &serde_json::Value) -> Result<Self> {
        let payload: ItemPayload = serde_json::from_value(value.clone())?;
        Ok(Self::from_pull_request(payload))
    }

    fn from_payload(payload: ItemPayload, is_pull_request: bool) -> Self {
        Self {
            number: payload.number,
            title: payload.title,
            body: payload.body.filter(|b| !b.trim().is_empty()),
            labels: payload.labels.into_iter().map(|l| l.name).collect(),
            author_login: payload.user.login,
            state: payload.state,
            is_pull_request,
            url: payload.html_url,
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Human-readable kind, used in Jira descriptions and log lines
    pub fn kind(&self) -> &'static str {
        if self.is_pull_request {
            "pull request"
        } else {
            "issue"
        }
    }
}
