//! PR-issue linker
//!
//! Appends the Jira keys of the issues a pull request closes to the pull
//! request title, e.g. `Fix crash (PROJ-12 PROJ-40)`. This is the only
//! write back to GitHub.

use super::Mirror;
use crate::integrations::{GitHubApi, JiraApi};
use crate::model::{ClosingIssueRef, GitHubItemDescriptor, JiraKeyPattern, JiraLinkKey};
use crate::Result;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

fn empty_parens() -> &'static Regex {
    static EMPTY_PARENS: OnceLock<Regex> = OnceLock::new();
    EMPTY_PARENS.get_or_init(|| Regex::new(r"\(\s*\)").expect("valid regex"))
}

/// The last key in each closing issue title, first occurrence order, no
/// duplicates
pub fn collect_keys(pattern: &JiraKeyPattern, closing: &[ClosingIssueRef]) -> Vec<JiraLinkKey> {
    let mut keys: Vec<JiraLinkKey> = Vec::new();
    for issue in closing {
        if let Some(key) = pattern.last_in(&issue.title) {
            debug!(issue = issue.number, key = %key, "Found linked issue");
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    keys
}

/// Rewrite `title` to end with `(<key1> <key2> ...)`
///
/// Existing keys of the project and the empty parentheses they leave behind
/// are removed first.
pub fn link_title(title: &str, pattern: &JiraKeyPattern, keys: &[JiraLinkKey]) -> String {
    let stripped = pattern.strip(title);
    let stripped = empty_parens().replace_all(&stripped, "");
    let base = stripped.trim();
    let keys = keys
        .iter()
        .map(JiraLinkKey::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    if base.is_empty() {
        format!("({})", keys)
    } else {
        format!("{} ({})", base, keys)
    }
}

impl<J, G> Mirror<'_, J, G>
where
    J: JiraApi + ?Sized,
    G: GitHubApi + ?Sized,
{
    /// Add the Jira keys of closing issues to a pull request title
    ///
    /// Returns true if the title was changed.
    pub async fn find_and_link_pr_issues(&self, item: &GitHubItemDescriptor) -> Result<bool> {
        if !item.is_pull_request {
            return Ok(false);
        }

        let closing = self.github.closing_issues(item.number).await?;
        let keys = collect_keys(&self.keys, &closing);
        if keys.is_empty() {
            debug!(number = item.number, "No closing issue carries a Jira key");
            return Ok(false);
        }

        let title = link_title(&item.title, &self.keys, &keys);
        if title == item.title {
            debug!(number = item.number, "Pull request title already linked");
            return Ok(false);
        }

        info!(number = item.number, title = %title, "Linking pull request title");
        self.github.update_title(item.number, &title).await?;
        Ok(true)
    }
}
