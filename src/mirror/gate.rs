//! Gating policy
//!
//! Decides whether an event's item should be mirrored at all. Checked in
//! order, first failure wins:
//! 1. Pull requests from repository collaborators are skipped unless they
//!    carry the sync label (the team tracks its own PRs in Jira directly).
//! 2. When a sync label is configured, items without it are skipped.

use super::Mirror;
use crate::integrations::{GitHubApi, JiraApi};
use crate::model::GitHubItemDescriptor;
use crate::Result;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    /// Pull request authored by a collaborator, no sync label
    CollaboratorPullRequest,
    /// Sync label configured but absent from the item
    MissingSyncLabel(String),
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateDecision::Proceed => f.write_str("proceed"),
            GateDecision::CollaboratorPullRequest => {
                f.write_str("Skipping issue sync for pull request from collaborator")
            }
            GateDecision::MissingSyncLabel(label) => write!(
                f,
                "Skipping issue sync because the item is missing the {} label",
                label
            ),
        }
    }
}

/// Evaluate both filters for an item
pub fn gate_decision(
    item: &GitHubItemDescriptor,
    sync_label: Option<&str>,
    is_collaborator: bool,
) -> GateDecision {
    let has_sync_label = sync_label.is_some_and(|label| item.has_label(label));

    if item.is_pull_request && is_collaborator && !has_sync_label {
        return GateDecision::CollaboratorPullRequest;
    }

    match sync_label {
        Some(label) if !has_sync_label => GateDecision::MissingSyncLabel(label.to_string()),
        _ => GateDecision::Proceed,
    }
}

impl<J, G> Mirror<'_, J, G>
where
    J: JiraApi + ?Sized,
    G: GitHubApi + ?Sized,
{
    /// Apply the gating policy, asking GitHub about collaborators only when
    /// the answer can change the decision
    pub async fn gate(&self, item: &GitHubItemDescriptor) -> Result<GateDecision> {
        let sync_label = self.sync.sync_label.as_deref();
        let has_sync_label = sync_label.is_some_and(|label| item.has_label(label));

        let is_collaborator = if item.is_pull_request && !has_sync_label {
            let collaborator = self.github.is_collaborator(&item.author_login).await?;
            debug!(login = %item.author_login, collaborator, "Checked collaborator status");
            collaborator
        } else {
            false
        };

        Ok(gate_decision(item, sync_label, is_collaborator))
    }
}
