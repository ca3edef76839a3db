//! Reconciliation sweep over open pull requests

use super::Mirror;
use crate::integrations::{GitHubApi, JiraApi};
use crate::Result;
use std::collections::HashMap;
use tracing::{debug, info};

/// Counts from one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub skipped_collaborators: usize,
    pub created: usize,
    pub existing: usize,
}

impl<J, G> Mirror<'_, J, G>
where
    J: JiraApi + ?Sized,
    G: GitHubApi + ?Sized,
{
    /// Make sure every open pull request from a non-collaborator has a Jira
    /// issue. Catches PRs whose webhook run was dropped or failed.
    pub async fn sync_remain_prs(&self) -> Result<SweepReport> {
        let pulls = self.github.list_open_pulls().await?;
        let mut collaborators: HashMap<String, bool> = HashMap::new();
        let mut report = SweepReport::default();

        for pull in &pulls {
            report.scanned += 1;

            let is_collaborator = match collaborators.get(&pull.author_login) {
                Some(known) => *known,
                None => {
                    let known = self.github.is_collaborator(&pull.author_login).await?;
                    collaborators.insert(pull.author_login.clone(), known);
                    known
                }
            };
            if is_collaborator {
                debug!(number = pull.number, login = %pull.author_login, "Skipping collaborator PR");
                report.skipped_collaborators += 1;
                continue;
            }

            if self.find_or_create(pull).await?.created {
                report.created += 1;
            } else {
                report.existing += 1;
            }
        }

        info!(
            scanned = report.scanned,
            skipped_collaborators = report.skipped_collaborators,
            created = report.created,
            existing = report.existing,
            "Reconciliation sweep finished"
        );
        Ok(report)
    }
}
