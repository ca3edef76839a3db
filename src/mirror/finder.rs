//! Jira issue finder/creator
//!
//! A mirrored Jira issue is located by the `GitHub reference: <url>` line in
//! its description. Jira's full-text search narrows the candidates and an
//! exact line match decides, since `.../issues/1` fuzzily matches
//! `.../issues/12`. Every page of the search is checked: newer issues that
//! merely mention the url sort ahead of the real mirror.

use super::Mirror;
use crate::config::JiraMapping;
use crate::integrations::{GitHubApi, JiraApi, JiraIssue, NewJiraIssue};
use crate::model::GitHubItemDescriptor;
use crate::{MirrorError, Result};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Prefix of the cross-reference line in mirrored descriptions
pub const REFERENCE_PREFIX: &str = "GitHub reference: ";

/// Jira rejects longer summaries
const MAX_SUMMARY_CHARS: usize = 255;

const SEARCH_PAGE_SIZE: u32 = 50;

/// A Jira issue located or created for a GitHub item
#[derive(Debug, Clone, PartialEq)]
pub struct MirroredIssue {
    pub issue: JiraIssue,
    pub created: bool,
}

/// `<title> (GitHub #<number>)`, truncating the title to fit
pub fn summary_for(item: &GitHubItemDescriptor) -> String {
    let suffix = format!(" (GitHub #{})", item.number);
    let room = MAX_SUMMARY_CHARS.saturating_sub(suffix.chars().count());
    let title: String = item.title.trim().chars().take(room).collect();
    format!("{}{}", title.trim_end(), suffix)
}

pub fn description_for(item: &GitHubItemDescriptor) -> String {
    let mut description = String::new();
    if let Some(body) = item.body.as_deref() {
        description.push_str(body.trim_end());
        description.push_str("\n\n");
    }
    description.push_str("----\n");
    description.push_str(&format!(
        "This {} was opened on GitHub by {}.\n",
        item.kind(),
        item.author_login
    ));
    description.push_str(REFERENCE_PREFIX);
    description.push_str(&item.url);
    description
}

/// Jira labels for an item: GitHub labels with whitespace replaced by `-`,
/// plus the configured extra labels
pub fn labels_for(item: &GitHubItemDescriptor, mapping: &JiraMapping) -> BTreeSet<String> {
    item.labels
        .iter()
        .map(|label| jira_label(label))
        .chain(mapping.extra_labels.iter().cloned())
        .filter(|label| !label.is_empty())
        .collect()
}

fn jira_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join("-")
}

/// JQL narrowing the search to issues whose description mentions `url`
///
/// Quotes and backslashes are dropped from the phrase; the exact reference
/// match afterwards still uses the full url.
pub fn jql_for(project: &str, url: &str) -> String {
    let phrase: String = url.chars().filter(|c| *c != '"' && *c != '\\').collect();
    format!(
        "project = \"{}\" AND description ~ \"\\\"{}\\\"\" ORDER BY created DESC",
        project, phrase
    )
}

/// Whether `issue` carries the cross-reference line for `url`
pub fn references(issue: &JiraIssue, url: &str) -> bool {
    issue
        .fields
        .description
        .as_deref()
        .is_some_and(|description| {
            description
                .lines()
                .filter_map(|line| line.trim().strip_prefix(REFERENCE_PREFIX))
                .any(|reference| reference.trim() == url)
        })
}

impl<J, G> Mirror<'_, J, G>
where
    J: JiraApi + ?Sized,
    G: GitHubApi + ?Sized,
{
    /// The unique Jira issue mirroring `item`, if any
    ///
    /// Returns [`MirrorError::AmbiguousMirror`] when several issues claim the
    /// same GitHub url; picking one could corrupt an unrelated issue.
    pub async fn find_issue(&self, item: &GitHubItemDescriptor) -> Result<Option<JiraIssue>> {
        let jql = jql_for(&self.project, &item.url);
        let mut matches: Vec<JiraIssue> = Vec::new();
        let mut start_at = 0;

        loop {
            let page = self.jira.search(&jql, start_at, SEARCH_PAGE_SIZE).await?;
            let fetched = page.issues.len() as u32;
            matches.extend(
                page.issues
                    .into_iter()
                    .filter(|issue| references(issue, &item.url)),
            );

            start_at = page.start_at + fetched;
            if fetched == 0 || start_at >= page.total {
                break;
            }
        }

        match matches.len() {
            0 => {
                debug!(number = item.number, url = %item.url, "No Jira issue found");
                Ok(None)
            }
            1 => {
                let issue = matches.remove(0);
                debug!(number = item.number, key = %issue.key, "Found Jira issue");
                Ok(Some(issue))
            }
            _ => Err(MirrorError::AmbiguousMirror {
                url: item.url.clone(),
                keys: matches.into_iter().map(|issue| issue.key).collect(),
            }),
        }
    }

    /// Create the Jira issue for `item` and link back to GitHub
    ///
    /// Callers must have run [`find_issue`](Self::find_issue) first.
    pub async fn create_issue(&self, item: &GitHubItemDescriptor) -> Result<JiraIssue> {
        let new_issue = NewJiraIssue {
            summary: summary_for(item),
            description: description_for(item),
            issue_type: self.mapping.issue_type.clone(),
            labels: labels_for(item, &self.mapping).into_iter().collect(),
        };

        let issue = self.jira.create_issue(&new_issue).await?;
        self.jira
            .add_remote_link(
                &issue.key,
                &item.url,
                &format!("GitHub #{}: {}", item.number, item.title),
            )
            .await?;

        info!(
            key = %issue.key,
            number = item.number,
            kind = item.kind(),
            "Created Jira issue"
        );
        Ok(issue)
    }

    pub async fn find_or_create(&self, item: &GitHubItemDescriptor) -> Result<MirroredIssue> {
        if let Some(issue) = self.find_issue(item).await? {
            return Ok(MirroredIssue {
                issue,
                created: false,
            });
        }
        let issue = self.create_issue(item).await?;
        Ok(MirroredIssue {
            issue,
            created: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::JiraFields;
    use crate::integrations::JiraStatus;
    use crate::model::ItemState;

    fn item() -> GitHubItemDescriptor {
        GitHubItemDescriptor {
            number: 1,
            title: "Crash on start".to_string(),
            body: Some("Steps to reproduce\n".to_string()),
            labels: ["bug", "good first issue"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
            author_login: "octocat".to_string(),
            state: ItemState::Open,
            is_pull_request: false,
            url: "https://github.com/acme/widget/issues/1".to_string(),
        }
    }

    fn jira_issue(description: Option<&str>) -> JiraIssue {
        JiraIssue {
            key: "PROJ-1".to_string(),
            id: "10000".to_string(),
            fields: JiraFields {
                summary: "Crash on start (GitHub #1)".to_string(),
                description: description.map(str::to_string),
                issue_type: None,
                status: JiraStatus {
                    name: "To Do".to_string(),
                    id: None,
                    status_category: None,
                },
                labels: Vec::new(),
            },
        }
    }

    #[test]
    fn test_summary() {
        assert_eq!(summary_for(&item()), "Crash on start (GitHub #1)");

        let mut long = item();
        long.title = "x".repeat(400);
        let summary = summary_for(&long);
        assert_eq!(summary.chars().count(), MAX_SUMMARY_CHARS);
        assert!(summary.ends_with(" (GitHub #1)"));
    }

    #[test]
    fn test_description_carries_reference() {
        let description = description_for(&item());
        assert!(description.starts_with("Steps to reproduce\n\n----\n"));
        assert!(description.contains("This issue was opened on GitHub by octocat."));
        assert!(description.ends_with("GitHub reference: https://github.com/acme/widget/issues/1"));

        let mut bodiless = item();
        bodiless.body = None;
        assert!(description_for(&bodiless).starts_with("----\n"));
    }

    #[test]
    fn test_labels_replace_whitespace() {
        let mapping = JiraMapping {
            extra_labels: vec!["github".to_string()],
            ..JiraMapping::default()
        };
        let labels: Vec<String> = labels_for(&item(), &mapping).into_iter().collect();
        assert_eq!(labels, vec!["bug", "github", "good-first-issue"]);
    }

    #[test]
    fn test_jql() {
        assert_eq!(
            jql_for("PROJ", "https://github.com/acme/widget/issues/1"),
            r#"project = "PROJ" AND description ~ "\"https://github.com/acme/widget/issues/1\"" ORDER BY created DESC"#
        );
    }

    #[test]
    fn test_references_is_exact() {
        let issue = jira_issue(Some(&description_for(&item())));
        assert!(references(&issue, "https://github.com/acme/widget/issues/1"));
        assert!(!references(&issue, "https://github.com/acme/widget/issues/12"));

        let mut twelve = item();
        twelve.url = "https://github.com/acme/widget/issues/12".to_string();
        let issue = jira_issue(Some(&description_for(&twelve)));
        assert!(!references(&issue, "https://github.com/acme/widget/issues/1"));

        assert!(!references(&jira_issue(None), "https://github.com/acme/widget/issues/1"));
    }
}
