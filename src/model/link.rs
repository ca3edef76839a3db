//! Jira keys and pull request closing references

use crate::{MirrorError, Result};
use regex::Regex;
use serde::Deserialize;
use std::fmt;

/// A Jira issue key such as `PROJ-123`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JiraLinkKey(String);

impl JiraLinkKey {
    /// Parse a key of the form `<PROJECT>-<digits>`
    pub fn parse(s: &str) -> Option<Self> {
        let (project, number) = s.rsplit_once('-')?;
        let mut chars = project.chars();
        let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_uppercase());
        let project_ok = starts_with_letter
            && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        let number_ok = !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
        (project_ok && number_ok).then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JiraLinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An issue a pull request will close, as returned by the
/// `closingIssuesReferences` GraphQL connection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClosingIssueRef {
    pub number: u64,
    pub title: String,
}

/// Matches keys of one configured Jira project inside free text
#[derive(Debug, Clone)]
pub struct JiraKeyPattern {
    key: Regex,
    token: Regex,
}

impl JiraKeyPattern {
    pub fn new(project: &str) -> Result<Self> {
        let project = regex::escape(project);
        let key = Regex::new(&format!(r"\b{}-\d+\b", project))
            .map_err(|e| MirrorError::Config(format!("Invalid Jira project key: {}", e)))?;
        // Also catches a dangling `PROJ-` left behind by hand edits
        let token = Regex::new(&format!(r"\b{}-\d*", project))
            .map_err(|e| MirrorError::Config(format!("Invalid Jira project key: {}", e)))?;
        Ok(Self { key, token })
    }

    /// The last key mentioned in `text`
    pub fn last_in(&self, text: &str) -> Option<JiraLinkKey> {
        self.key
            .find_iter(text)
            .last()
            .and_then(|m| JiraLinkKey::parse(m.as_str()))
    }

    /// `text` with every key of this project removed
    pub fn strip(&self, text: &str) -> String {
        self.token.replace_all(text, "").into_owned()
    }
}
