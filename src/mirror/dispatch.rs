//! Action dispatch
//!
//! `(category, verb)` pairs resolve to a [`Route`]; each route runs exactly
//! one handler. Verbs GitHub may add later resolve to nothing and are logged
//! and skipped.

use super::event::{ActionEvent, EventCategory, MIRROR_ISSUES_ACTION};
use super::Mirror;
use crate::integrations::{GitHubApi, JiraApi};
use crate::{MirrorError, Result};
use tracing::info;

/// Lifecycle verbs of the `issues` category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueAction {
    Opened,
    Edited,
    Closed,
    Deleted,
    Reopened,
    Labeled,
    Unlabeled,
}

impl IssueAction {
    pub const ALL: [IssueAction; 7] = [
        IssueAction::Opened,
        IssueAction::Edited,
        IssueAction::Closed,
        IssueAction::Deleted,
        IssueAction::Reopened,
        IssueAction::Labeled,
        IssueAction::Unlabeled,
    ];

    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "opened" => Some(IssueAction::Opened),
            "edited" => Some(IssueAction::Edited),
            "closed" => Some(IssueAction::Closed),
            "deleted" => Some(IssueAction::Deleted),
            "reopened" => Some(IssueAction::Reopened),
            "labeled" => Some(IssueAction::Labeled),
            "unlabeled" => Some(IssueAction::Unlabeled),
            _ => None,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            IssueAction::Opened => "opened",
            IssueAction::Edited => "edited",
            IssueAction::Closed => "closed",
            IssueAction::Deleted => "deleted",
            IssueAction::Reopened => "reopened",
            IssueAction::Labeled => "labeled",
            IssueAction::Unlabeled => "unlabeled",
        }
    }
}

/// Verbs of the `issue_comment` category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentAction {
    Created,
    Edited,
    Deleted,
}

impl CommentAction {
    pub const ALL: [CommentAction; 3] = [
        CommentAction::Created,
        CommentAction::Edited,
        CommentAction::Deleted,
    ];

    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "created" => Some(CommentAction::Created),
            "edited" => Some(CommentAction::Edited),
            "deleted" => Some(CommentAction::Deleted),
            _ => None,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            CommentAction::Created => "created",
            CommentAction::Edited => "edited",
            CommentAction::Deleted => "deleted",
        }
    }
}

/// A resolved handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Issue(IssueAction),
    Comment(CommentAction),
    ManualMirror,
}

impl Route {
    pub fn resolve(category: EventCategory, verb: &str) -> Option<Self> {
        match category {
            EventCategory::Issues => IssueAction::from_verb(verb).map(Route::Issue),
            EventCategory::IssueComment => CommentAction::from_verb(verb).map(Route::Comment),
            EventCategory::WorkflowDispatch => {
                (verb == MIRROR_ISSUES_ACTION).then_some(Route::ManualMirror)
            }
        }
    }

    pub fn handler_name(self) -> &'static str {
        match self {
            Route::Issue(IssueAction::Opened) => "handle_issue_opened",
            Route::Issue(IssueAction::Edited) => "handle_issue_edited",
            Route::Issue(IssueAction::Closed) => "handle_issue_closed",
            Route::Issue(IssueAction::Deleted) => "handle_issue_deleted",
            Route::Issue(IssueAction::Reopened) => "handle_issue_reopened",
            Route::Issue(IssueAction::Labeled) => "handle_issue_labeled",
            Route::Issue(IssueAction::Unlabeled) => "handle_issue_unlabeled",
            Route::Comment(CommentAction::Created) => "handle_comment_created",
            Route::Comment(CommentAction::Edited) => "handle_comment_edited",
            Route::Comment(CommentAction::Deleted) => "handle_comment_deleted",
            Route::ManualMirror => "handle_manual_mirror",
        }
    }
}

/// Result of dispatching one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled(Route),
    Unroutable,
}

impl<J, G> Mirror<'_, J, G>
where
    J: JiraApi + ?Sized,
    G: GitHubApi + ?Sized,
{
    /// Run the single handler for `event`, or log and skip it
    pub async fn dispatch(&self, event: &ActionEvent) -> Result<Dispatch> {
        let Some(route) = Route::resolve(event.category, &event.verb) else {
            info!(
                category = %event.category,
                action = %event.verb,
                "No handler for '{}' action '{}'. Skipping.",
                event.category,
                event.verb
            );
            return Ok(Dispatch::Unroutable);
        };

        info!(
            handler = route.handler_name(),
            number = event.item.number,
            kind = event.item.kind(),
            "Dispatching event"
        );

        let item = &event.item;
        match route {
            Route::Issue(action) => match action {
                IssueAction::Opened => self.handle_issue_opened(item).await?,
                IssueAction::Edited => self.handle_issue_edited(item).await?,
                IssueAction::Closed => self.handle_issue_closed(item).await?,
                IssueAction::Deleted => self.handle_issue_deleted(item).await?,
                IssueAction::Reopened => self.handle_issue_reopened(item).await?,
                IssueAction::Labeled | IssueAction::Unlabeled => {
                    self.handle_issue_labels(item).await?
                }
            },
            Route::Comment(action) => {
                let comment = event.comment.as_ref().ok_or_else(|| {
                    MirrorError::Parse("issue_comment event without a comment".to_string())
                })?;
                match action {
                    CommentAction::Created | CommentAction::Edited => {
                        self.handle_comment_upsert(item, comment).await?
                    }
                    CommentAction::Deleted => self.handle_comment_deleted(item, comment).await?,
                }
            }
            Route::ManualMirror => self.handle_manual_mirror(item).await?,
        }

        Ok(Dispatch::Handled(route))
    }
}
