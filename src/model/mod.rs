//! Core data structures
//!
//! - [`GitHubItemDescriptor`]: the single shape every issue and pull request is
//!   normalized into before any sync decision is made
//! - [`JiraLinkKey`] / [`JiraKeyPattern`]: Jira issue keys and the per-project
//!   pattern used to find them in free text
//! - [`ClosingIssueRef`]: an issue a pull request will close

mod item;
mod link;

pub use item::{
    CommentAuthor, GitHubComment, GitHubItemDescriptor, ItemPayload, ItemState, LabelPayload,
    UserPayload,
};
pub use link::{ClosingIssueRef, JiraKeyPattern, JiraLinkKey};
