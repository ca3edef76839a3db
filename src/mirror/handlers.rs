//! Sync handlers
//!
//! One handler per routed action. Each starts from find-or-create (except
//! `deleted`, which never creates) and only writes when Jira differs from
//! GitHub, so re-delivered events are harmless.

use super::finder::{description_for, labels_for, summary_for};
use super::Mirror;
use crate::integrations::{GitHubApi, JiraApi, JiraIssue, JiraTransition};
use crate::model::{GitHubComment, GitHubItemDescriptor, ItemState};
use crate::Result;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

const DELETED_MARKER: &str = "[gh-deleted]";

/// Labels to add and remove so a Jira issue matches the desired set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDelta {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl LabelDelta {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

pub fn label_delta(current: &[String], desired: &BTreeSet<String>) -> LabelDelta {
    let current: BTreeSet<&String> = current.iter().collect();
    LabelDelta {
        add: desired
            .iter()
            .filter(|label| !current.contains(label))
            .cloned()
            .collect(),
        remove: current
            .iter()
            .filter(|label| !desired.contains(label.as_str()))
            .map(|label| label.to_string())
            .collect(),
    }
}

/// Pick a transition into (or out of) the done category
///
/// A transition whose target or own name matches `preferred` wins. Otherwise
/// the first one in the right category; reopening favors a "new" target
/// (To Do) over work-in-progress ones.
pub fn choose_transition<'t>(
    transitions: &'t [JiraTransition],
    want_done: bool,
    preferred: Option<&str>,
) -> Option<&'t JiraTransition> {
    let candidates: Vec<&JiraTransition> = transitions
        .iter()
        .filter(|t| t.to.is_done() == want_done)
        .collect();

    let by_name = preferred.and_then(|name| {
        candidates
            .iter()
            .copied()
            .find(|t| t.to.name.eq_ignore_ascii_case(name) || t.name.eq_ignore_ascii_case(name))
    });
    let by_category = (!want_done)
        .then(|| {
            candidates.iter().copied().find(|t| {
                t.to.status_category
                    .as_ref()
                    .is_some_and(|category| category.key == "new")
            })
        })
        .flatten();

    by_name
        .or(by_category)
        .or_else(|| candidates.first().copied())
}

pub fn comment_marker(comment_id: u64) -> String {
    format!("[gh-comment-id: {}]", comment_id)
}

/// Whether `body` was written by the mirror with `marker`
///
/// Only the final line counts, so a GitHub comment quoting a marker is not
/// taken for the mirrored one.
pub fn has_marker(body: &str, marker: &str) -> bool {
    body.trim_end()
        .lines()
        .last()
        .is_some_and(|line| line.trim() == marker)
}

/// Jira body mirroring a GitHub comment
pub fn render_comment(comment: &GitHubComment) -> String {
    format!(
        "{} commented on GitHub ({}):\n\n{}\n\n{}",
        comment.user.login,
        comment.html_url,
        comment.body.as_deref().unwrap_or_default().trim_end(),
        comment_marker(comment.id)
    )
}

impl<J, G> Mirror<'_, J, G>
where
    J: JiraApi + ?Sized,
    G: GitHubApi + ?Sized,
{
    pub async fn handle_issue_opened(&self, item: &GitHubItemDescriptor) -> Result<()> {
        self.find_or_create(item).await?;
        self.link_pull_request(item).await
    }

    /// Edits can arrive before the open event was processed, so this may
    /// create the issue
    pub async fn handle_issue_edited(&self, item: &GitHubItemDescriptor) -> Result<()> {
        let mirrored = self.find_or_create(item).await?;
        if !mirrored.created {
            self.sync_fields(&mirrored.issue, item).await?;
        }
        self.link_pull_request(item).await
    }

    pub async fn handle_issue_closed(&self, item: &GitHubItemDescriptor) -> Result<()> {
        let mirrored = self.find_or_create(item).await?;
        self.sync_status(&mirrored.issue, true).await?;
        Ok(())
    }

    pub async fn handle_issue_reopened(&self, item: &GitHubItemDescriptor) -> Result<()> {
        let mirrored = self.find_or_create(item).await?;
        self.sync_status(&mirrored.issue, false).await?;
        Ok(())
    }

    /// Shared by `labeled` and `unlabeled`: the payload carries the full
    /// label set after the change
    pub async fn handle_issue_labels(&self, item: &GitHubItemDescriptor) -> Result<()> {
        let mirrored = self.find_or_create(item).await?;
        self.sync_labels(&mirrored.issue, item).await?;
        Ok(())
    }

    pub async fn handle_issue_deleted(&self, item: &GitHubItemDescriptor) -> Result<()> {
        let Some(issue) = self.find_issue(item).await? else {
            info!(number = item.number, "Deleted item was never mirrored, nothing to do");
            return Ok(());
        };

        let comments = self.jira.get_comments(&issue.key).await?;
        if !comments.iter().any(|c| has_marker(&c.body, DELETED_MARKER)) {
            let body = format!(
                "The GitHub {} {} was deleted.\n\n{}",
                item.kind(),
                item.url,
                DELETED_MARKER
            );
            self.jira.add_comment(&issue.key, &body).await?;
        }

        self.sync_status(&issue, true).await?;
        Ok(())
    }

    /// Comment `created` and `edited`
    pub async fn handle_comment_upsert(
        &self,
        item: &GitHubItemDescriptor,
        comment: &GitHubComment,
    ) -> Result<()> {
        let mirrored = self.find_or_create(item).await?;
        let key = &mirrored.issue.key;
        let marker = comment_marker(comment.id);
        let body = render_comment(comment);

        let existing = self
            .jira
            .get_comments(key)
            .await?
            .into_iter()
            .find(|c| has_marker(&c.body, &marker));

        match existing {
            Some(existing) if existing.body == body => {
                debug!(key = %key, comment = comment.id, "Jira comment already up to date");
            }
            Some(existing) => {
                self.jira.update_comment(key, &existing.id, &body).await?;
            }
            None => {
                self.jira.add_comment(key, &body).await?;
            }
        }
        Ok(())
    }

    pub async fn handle_comment_deleted(
        &self,
        item: &GitHubItemDescriptor,
        comment: &GitHubComment,
    ) -> Result<()> {
        let mirrored = self.find_or_create(item).await?;
        let key = &mirrored.issue.key;
        let marker = comment_marker(comment.id);

        let comments = self.jira.get_comments(key).await?;
        match comments.into_iter().find(|c| has_marker(&c.body, &marker)) {
            Some(existing) => self.jira.delete_comment(key, &existing.id).await,
            None => {
                debug!(key = %key, comment = comment.id, "No mirrored comment to delete");
                Ok(())
            }
        }
    }

    /// Full reconcile of one item requested by an operator
    pub async fn handle_manual_mirror(&self, item: &GitHubItemDescriptor) -> Result<()> {
        let mirrored = self.find_or_create(item).await?;
        if !mirrored.created {
            self.sync_fields(&mirrored.issue, item).await?;
        }
        self.sync_labels(&mirrored.issue, item).await?;
        self.sync_status(&mirrored.issue, item.state == ItemState::Closed)
            .await?;
        Ok(())
    }

    async fn sync_fields(&self, issue: &JiraIssue, item: &GitHubItemDescriptor) -> Result<bool> {
        let summary = summary_for(item);
        let description = description_for(item);
        if issue.fields.summary == summary
            && issue.fields.description.as_deref() == Some(description.as_str())
        {
            debug!(key = %issue.key, "Summary and description unchanged");
            return Ok(false);
        }
        self.jira
            .update_issue(&issue.key, &summary, &description)
            .await?;
        Ok(true)
    }

    async fn sync_labels(&self, issue: &JiraIssue, item: &GitHubItemDescriptor) -> Result<bool> {
        let delta = label_delta(&issue.fields.labels, &labels_for(item, &self.mapping));
        if delta.is_empty() {
            debug!(key = %issue.key, "Labels unchanged");
            return Ok(false);
        }
        self.jira
            .set_labels(&issue.key, &delta.add, &delta.remove)
            .await?;
        Ok(true)
    }

    /// Move `issue` into (`want_done`) or out of the done category
    ///
    /// A workflow without a fitting transition is logged and skipped.
    async fn sync_status(&self, issue: &JiraIssue, want_done: bool) -> Result<bool> {
        if issue.fields.status.is_done() == want_done {
            debug!(key = %issue.key, status = %issue.fields.status.name, "Status already in sync");
            return Ok(false);
        }

        let preferred = if want_done {
            self.mapping.close_status.as_deref()
        } else {
            self.mapping.reopen_status.as_deref()
        };

        let transitions = self.jira.get_transitions(&issue.key).await?;
        let Some(transition) = choose_transition(&transitions, want_done, preferred) else {
            let available: Vec<&str> = transitions.iter().map(|t| t.to.name.as_str()).collect();
            warn!(
                key = %issue.key,
                want_done,
                available = ?available,
                "No Jira transition fits, leaving status unchanged"
            );
            return Ok(false);
        };

        info!(
            key = %issue.key,
            from = %issue.fields.status.name,
            to = %transition.to.name,
            "Transitioning Jira issue"
        );
        self.jira
            .transition_status(&issue.key, &transition.id)
            .await?;
        Ok(true)
    }

    async fn link_pull_request(&self, item: &GitHubItemDescriptor) -> Result<()> {
        if item.is_pull_request && self.mapping.link_pr_titles {
            self.find_and_link_pr_issues(item).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::{JiraStatus, JiraStatusCategory};
    use crate::model::CommentAuthor;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn transition(id: &str, to: &str, category: &str) -> JiraTransition {
        JiraTransition {
            id: id.to_string(),
            name: format!("Move to {}", to),
            to: JiraStatus {
                name: to.to_string(),
                id: None,
                status_category: Some(JiraStatusCategory {
                    key: category.to_string(),
                    name: category.to_string(),
                }),
            },
        }
    }

    #[test]
    fn test_label_delta_adds_only_missing() {
        let desired: BTreeSet<String> = labels(&["a", "b", "c"]).into_iter().collect();
        let delta = label_delta(&labels(&["a", "b"]), &desired);
        assert_eq!(delta.add, labels(&["c"]));
        assert!(delta.remove.is_empty());
    }

    #[test]
    fn test_label_delta_removes_stale() {
        let desired: BTreeSet<String> = labels(&["a"]).into_iter().collect();
        let delta = label_delta(&labels(&["a", "stale"]), &desired);
        assert!(delta.add.is_empty());
        assert_eq!(delta.remove, labels(&["stale"]));
        assert!(label_delta(&labels(&["a"]), &desired).is_empty());
    }

    #[test]
    fn test_choose_transition() {
        let transitions = vec![
            transition("11", "In Progress", "indeterminate"),
            transition("21", "Done", "done"),
            transition("31", "Won't Fix", "done"),
            transition("41", "To Do", "new"),
        ];

        assert_eq!(choose_transition(&transitions, true, None).unwrap().id, "21");
        assert_eq!(
            choose_transition(&transitions, true, Some("won't fix")).unwrap().id,
            "31"
        );
        assert_eq!(
            choose_transition(&transitions, true, Some("Missing")).unwrap().id,
            "21"
        );
        assert_eq!(
            choose_transition(&transitions, false, Some("In Progress")).unwrap().id,
            "11"
        );
        assert_eq!(choose_transition(&transitions, false, None).unwrap().id, "41");
        assert!(choose_transition(&transitions[..1], true, None).is_none());
    }

    #[test]
    fn test_marker_only_on_last_line() {
        assert!(has_marker("text\n\n[gh-comment-id: 7]\n", "[gh-comment-id: 7]"));
        assert!(!has_marker(
            "quoting [gh-comment-id: 7] here\n\n[gh-comment-id: 8]",
            "[gh-comment-id: 7]"
        ));
        assert!(!has_marker("[gh-deleted]\nsee above", DELETED_MARKER));
        assert!(!has_marker("", DELETED_MARKER));
    }

    #[test]
    fn test_render_comment() {
        let comment = GitHubComment {
            id: 42,
            body: Some("Same here\n".to_string()),
            user: CommentAuthor {
                login: "someone".to_string(),
            },
            html_url: "https://github.com/acme/widget/issues/3#issuecomment-42".to_string(),
        };
        assert_eq!(
            render_comment(&comment),
            "someone commented on GitHub (https://github.com/acme/widget/issues/3#issuecomment-42):\n\nSame here\n\n[gh-comment-id: 42]"
        );
    }
}
