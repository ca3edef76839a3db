//! Mirror core
//!
//! Takes a classified trigger through gating and dispatch to the sync
//! handlers. Every Jira and GitHub call goes through the [`JiraApi`] and
//! [`GitHubApi`] traits.

mod dispatch;
mod event;
mod finder;
mod gate;
mod handlers;
mod linker;
mod sweep;

pub use dispatch::{CommentAction, Dispatch, IssueAction, Route};
pub use event::{
    classify, parse_issue_numbers, ActionEvent, EventCategory, Trigger, MIRROR_ISSUES_ACTION,
};
pub use finder::{
    description_for, jql_for, labels_for, references, summary_for, MirroredIssue,
    REFERENCE_PREFIX,
};
pub use gate::{gate_decision, GateDecision};
pub use handlers::{choose_transition, comment_marker, label_delta, render_comment, LabelDelta};
pub use linker::{collect_keys, link_title};
pub use sweep::SweepReport;

use crate::config::{JiraMapping, MirrorConfig, SyncOptions};
use crate::integrations::{GitHubApi, JiraApi};
use crate::model::JiraKeyPattern;
use crate::{MirrorError, Result};
use tracing::info;

/// What happened to one canonical event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Ignored(String),
    Gated(GateDecision),
    Unroutable,
    Handled(Route),
}

/// Mirrors one repository into one Jira project
pub struct Mirror<'a, J: JiraApi + ?Sized, G: GitHubApi + ?Sized> {
    jira: &'a J,
    github: &'a G,
    project: String,
    mapping: JiraMapping,
    sync: SyncOptions,
    keys: JiraKeyPattern,
}

impl<'a, J, G> Mirror<'a, J, G>
where
    J: JiraApi + ?Sized,
    G: GitHubApi + ?Sized,
{
    pub fn new(config: &MirrorConfig, jira: &'a J, github: &'a G) -> Result<Self> {
        let project = config
            .jira
            .as_ref()
            .map(|jira| jira.project.clone())
            .ok_or_else(|| MirrorError::Config("Jira is not configured".to_string()))?;

        Ok(Self {
            jira,
            github,
            keys: JiraKeyPattern::new(&project)?,
            project,
            mapping: config.mapping.clone(),
            sync: config.sync.clone(),
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Gate and dispatch one event
    ///
    /// Manual mirror events skip gating.
    pub async fn handle_event(&self, event: &ActionEvent) -> Result<EventOutcome> {
        if event.category != EventCategory::WorkflowDispatch {
            let decision = self.gate(&event.item).await?;
            if decision != GateDecision::Proceed {
                info!(number = event.item.number, "{}", decision);
                return Ok(EventOutcome::Gated(decision));
            }
        }

        Ok(match self.dispatch(event).await? {
            Dispatch::Handled(route) => EventOutcome::Handled(route),
            Dispatch::Unroutable => EventOutcome::Unroutable,
        })
    }

    /// Fetch each listed item and wrap it as a manual mirror event
    pub async fn expand_manual(&self, numbers: &[u64]) -> Result<Vec<ActionEvent>> {
        let mut events = Vec::with_capacity(numbers.len());
        for &number in numbers {
            let item = self.github.get_item(number).await?;
            events.push(ActionEvent {
                category: EventCategory::WorkflowDispatch,
                verb: MIRROR_ISSUES_ACTION.to_string(),
                item,
                comment: None,
                raw_payload: serde_json::Value::Null,
            });
        }
        Ok(events)
    }

    /// Run a trigger to completion, stopping at the first error
    pub async fn process(&self, trigger: Trigger) -> Result<Vec<EventOutcome>> {
        match trigger {
            Trigger::Ignored(reason) => {
                info!("{}", reason);
                Ok(vec![EventOutcome::Ignored(reason)])
            }
            Trigger::Event(event) => Ok(vec![self.handle_event(&event).await?]),
            Trigger::ManualMirror(numbers) => {
                info!(numbers = ?numbers, "Starting manual sync of issues");
                let mut outcomes = Vec::with_capacity(numbers.len());
                for event in self.expand_manual(&numbers).await? {
                    outcomes.push(self.handle_event(&event).await?);
                }
                Ok(outcomes)
            }
        }
    }
}
