//! Event classification
//!
//! Turns `(GITHUB_EVENT_NAME, payload)` into a [`Trigger`]. Pull request
//! events are folded into the `issues` category so every handler sees one
//! item shape.

use crate::model::{GitHubComment, GitHubItemDescriptor};
use crate::{MirrorError, Result};
use serde_json::Value;
use std::fmt;

/// Manual dispatch action that mirrors a list of issues
pub const MIRROR_ISSUES_ACTION: &str = "mirror-issues";

/// Category of a canonical event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Issue and pull request lifecycle events
    Issues,
    /// Comments on issues and pull requests
    IssueComment,
    /// Operator-requested mirroring of explicit issue numbers
    WorkflowDispatch,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventCategory::Issues => "issues",
            EventCategory::IssueComment => "issue_comment",
            EventCategory::WorkflowDispatch => "workflow_dispatch",
        })
    }
}

/// One canonical event, consumed by the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    pub category: EventCategory,
    /// The payload's `action`, e.g. "opened"
    pub verb: String,
    pub item: GitHubItemDescriptor,
    /// Set for `issue_comment` events
    pub comment: Option<GitHubComment>,
    pub raw_payload: Value,
}

/// What an invocation was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// A webhook event
    Event(Box<ActionEvent>),
    /// `workflow_dispatch` with `mirror-issues`; items still need fetching
    ManualMirror(Vec<u64>),
    /// Nothing to do, with the reason
    Ignored(String),
}

/// Classify a workflow trigger
///
/// Unknown event names are ignored rather than rejected. A known event whose
/// payload lacks `action` or the item object is a parse error.
pub fn classify(event_name: &str, payload: &Value) -> Result<Trigger> {
    let (category, item) = match event_name {
        "workflow_dispatch" => return classify_dispatch(payload),
        "issues" => (
            EventCategory::Issues,
            GitHubItemDescriptor::from_issue_json(object(payload, "issue")?)?,
        ),
        "issue_comment" => (
            EventCategory::IssueComment,
            GitHubItemDescriptor::from_issue_json(object(payload, "issue")?)?,
        ),
        // Forked PRs only get secrets through pull_request_target
        "pull_request" | "pull_request_target" => (
            EventCategory::Issues,
            GitHubItemDescriptor::from_pull_request_json(object(payload, "pull_request")?)?,
        ),
        other => {
            return Ok(Trigger::Ignored(format!(
                "No handler for event '{}'",
                other
            )))
        }
    };

    let verb = payload
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| MirrorError::Parse(format!("'{}' payload has no action", event_name)))?
        .to_string();

    let comment = match category {
        EventCategory::IssueComment => {
            Some(serde_json::from_value(object(payload, "comment")?.clone())?)
        }
        _ => None,
    };

    Ok(Trigger::Event(Box::new(ActionEvent {
        category,
        verb,
        item,
        comment,
        raw_payload: payload.clone(),
    })))
}

fn object<'a>(payload: &'a Value, key: &str) -> Result<&'a Value> {
    payload
        .get(key)
        .filter(|v| v.is_object())
        .ok_or_else(|| MirrorError::Parse(format!("payload has no '{}' object", key)))
}

fn classify_dispatch(payload: &Value) -> Result<Trigger> {
    let Some(inputs) = payload.get("inputs").filter(|v| v.is_object()) else {
        return Ok(Trigger::Ignored(
            "Triggered workflow_dispatch event without inputs".to_string(),
        ));
    };

    let action = inputs.get("action").and_then(Value::as_str);
    if action != Some(MIRROR_ISSUES_ACTION) {
        return Ok(Trigger::Ignored(format!(
            "workflow_dispatch needs input action \"{}\"",
            MIRROR_ISSUES_ACTION
        )));
    }

    let numbers = inputs
        .get("issue-numbers")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if numbers.is_empty() {
        return Ok(Trigger::Ignored(
            "workflow_dispatch needs input \"issue-numbers\"".to_string(),
        ));
    }

    Ok(Trigger::ManualMirror(parse_issue_numbers(numbers)?))
}

/// Parse a comma and/or whitespace separated list such as `"12, #15 20"`
pub fn parse_issue_numbers(input: &str) -> Result<Vec<u64>> {
    let mut numbers = Vec::new();
    for token in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let number: u64 = token
            .trim_start_matches('#')
            .parse()
            .map_err(|_| MirrorError::Parse(format!("Invalid issue number '{}'", token)))?;
        if !numbers.contains(&number) {
            numbers.push(number);
        }
    }
    Ok(numbers)
}
