//! In-memory Jira and GitHub used to drive the mirror in tests

#![allow(dead_code)]

use async_trait::async_trait;
use jira_mirror::config::{
    GitHubIntegration, JiraAuth, JiraIntegration, JiraMapping, MirrorConfig, SyncOptions,
};
use jira_mirror::integrations::{
    GitHubApi, JiraApi, JiraComment, JiraFields, JiraIssue, JiraSearchResponse, JiraStatus, JiraStatusCategory,
    JiraTransition, NewJiraIssue,
};
use jira_mirror::model::{ClosingIssueRef, GitHubItemDescriptor, ItemState};
use jira_mirror::{MirrorError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub const PROJECT: &str = "PROJ";

pub fn config(sync_label: Option<&str>) -> MirrorConfig {
    MirrorConfig {
        github: Some(GitHubIntegration {
            repository: "acme/widget".to_string(),
            api_url: "https://api.github.com".to_string(),
            graphql_url: "https://api.github.com/graphql".to_string(),
            token: Some("ghp_test".to_string()),
        }),
        jira: Some(JiraIntegration {
            url: "https://jira.example.com".to_string(),
            project: PROJECT.to_string(),
            auth: JiraAuth::Token("secret".to_string()),
        }),
        mapping: JiraMapping::default(),
        sync: SyncOptions::new(sync_label.map(str::to_string), false),
    }
}

pub fn issue(number: u64, labels: &[&str]) -> GitHubItemDescriptor {
    GitHubItemDescriptor {
        number,
        title: format!("Issue {}", number),
        body: Some(format!("Body of {}", number)),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        author_login: "reporter".to_string(),
        state: ItemState::Open,
        is_pull_request: false,
        url: format!("https://github.com/acme/widget/issues/{}", number),
    }
}

pub fn pull_request(number: u64, author: &str) -> GitHubItemDescriptor {
    GitHubItemDescriptor {
        number,
        title: format!("Change {}", number),
        body: None,
        labels: Default::default(),
        author_login: author.to_string(),
        state: ItemState::Open,
        is_pull_request: true,
        url: format!("https://github.com/acme/widget/pull/{}", number),
    }
}

fn status(name: &str, category: &str) -> JiraStatus {
    JiraStatus {
        name: name.to_string(),
        id: None,
        status_category: Some(JiraStatusCategory {
            key: category.to_string(),
            name: category.to_string(),
        }),
    }
}

#[derive(Debug, Default)]
pub struct JiraState {
    pub issues: Vec<JiraIssue>,
    pub comments: HashMap<String, Vec<JiraComment>>,
    pub searches: usize,
    pub creates: usize,
    pub updates: usize,
    pub label_updates: Vec<(String, Vec<String>, Vec<String>)>,
    pub remote_links: Vec<(String, String)>,
    pub comment_writes: usize,
    pub transitions: Vec<(String, String)>,
    next_comment_id: u64,
}

/// Jira whose search returns every issue newest first, like a fuzzy
/// full-text match, paged by `startAt`/`maxResults`
#[derive(Debug, Default)]
pub struct FakeJira {
    pub state: Mutex<JiraState>,
}

impl FakeJira {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an issue that already mirrors `item`
    pub fn seed(&self, item: &GitHubItemDescriptor, labels: &[&str]) -> String {
        let mut state = self.state.lock().unwrap();
        let key = format!("{}-{}", PROJECT, state.issues.len() + 1);
        let id = (10_000 + state.issues.len()).to_string();
        state.issues.push(JiraIssue {
            key: key.clone(),
            id,
            fields: JiraFields {
                summary: jira_mirror::mirror::summary_for(item),
                description: Some(jira_mirror::mirror::description_for(item)),
                issue_type: None,
                status: status("To Do", "new"),
                labels: labels.iter().map(|l| l.to_string()).collect(),
            },
        });
        key
    }

    pub fn issue(&self, key: &str) -> JiraIssue {
        let state = self.state.lock().unwrap();
        state
            .issues
            .iter()
            .find(|i| i.key == key)
            .cloned()
            .expect("issue exists")
    }

    pub fn comments(&self, key: &str) -> Vec<JiraComment> {
        let state = self.state.lock().unwrap();
        state.comments.get(key).cloned().unwrap_or_default()
    }

    /// Every write call made so far
    pub fn mutations(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.creates
            + state.updates
            + state.label_updates.len()
            + state.remote_links.len()
            + state.comment_writes
            + state.transitions.len()
    }
}

#[async_trait]
impl JiraApi for FakeJira {
    async fn search(
        &self,
        _jql: &str,
        start_at: u32,
        max_results: u32,
    ) -> Result<JiraSearchResponse> {
        let mut state = self.state.lock().unwrap();
        state.searches += 1;
        let issues = state
            .issues
            .iter()
            .rev()
            .skip(start_at as usize)
            .take(max_results as usize)
            .cloned()
            .collect();
        Ok(JiraSearchResponse {
            total: state.issues.len() as u32,
            start_at,
            max_results,
            issues,
        })
    }

    async fn create_issue(&self, issue: &NewJiraIssue) -> Result<JiraIssue> {
        let mut state = self.state.lock().unwrap();
        state.creates += 1;
        let created = JiraIssue {
            key: format!("{}-{}", PROJECT, state.issues.len() + 1),
            id: (10_000 + state.issues.len()).to_string(),
            fields: JiraFields {
                summary: issue.summary.clone(),
                description: Some(issue.description.clone()),
                issue_type: None,
                status: status("To Do", "new"),
                labels: issue.labels.clone(),
            },
        };
        state.issues.push(created.clone());
        Ok(created)
    }

    async fn update_issue(&self, key: &str, summary: &str, description: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.updates += 1;
        let issue = find_mut(&mut state.issues, key)?;
        issue.fields.summary = summary.to_string();
        issue.fields.description = Some(description.to_string());
        Ok(())
    }

    async fn set_labels(&self, key: &str, add: &[String], remove: &[String]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .label_updates
            .push((key.to_string(), add.to_vec(), remove.to_vec()));
        let issue = find_mut(&mut state.issues, key)?;
        issue.fields.labels.retain(|l| !remove.contains(l));
        for label in add {
            if !issue.fields.labels.contains(label) {
                issue.fields.labels.push(label.clone());
            }
        }
        Ok(())
    }

    async fn add_remote_link(&self, key: &str, url: &str, _title: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.remote_links.push((key.to_string(), url.to_string()));
        Ok(())
    }

    async fn get_comments(&self, key: &str) -> Result<Vec<JiraComment>> {
        Ok(self.comments(key))
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<JiraComment> {
        let mut state = self.state.lock().unwrap();
        state.comment_writes += 1;
        state.next_comment_id += 1;
        let comment = JiraComment {
            id: state.next_comment_id.to_string(),
            body: body.to_string(),
            author: None,
            created: None,
            updated: None,
        };
        state
            .comments
            .entry(key.to_string())
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, key: &str, comment_id: &str, body: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.comment_writes += 1;
        let comment = state
            .comments
            .get_mut(key)
            .and_then(|comments| comments.iter_mut().find(|c| c.id == comment_id))
            .ok_or_else(|| MirrorError::Integration(format!("No comment {}", comment_id)))?;
        comment.body = body.to_string();
        Ok(())
    }

    async fn delete_comment(&self, key: &str, comment_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.comment_writes += 1;
        if let Some(comments) = state.comments.get_mut(key) {
            comments.retain(|c| c.id != comment_id);
        }
        Ok(())
    }

    async fn get_transitions(&self, _key: &str) -> Result<Vec<JiraTransition>> {
        Ok(vec![
            JiraTransition {
                id: "11".to_string(),
                name: "Start".to_string(),
                to: status("In Progress", "indeterminate"),
            },
            JiraTransition {
                id: "21".to_string(),
                name: "Close".to_string(),
                to: status("Done", "done"),
            },
            JiraTransition {
                id: "31".to_string(),
                name: "Reopen".to_string(),
                to: status("To Do", "new"),
            },
        ])
    }

    async fn transition_status(&self, key: &str, transition_id: &str) -> Result<()> {
        let target = match transition_id {
            "11" => status("In Progress", "indeterminate"),
            "21" => status("Done", "done"),
            "31" => status("To Do", "new"),
            other => {
                return Err(MirrorError::Integration(format!(
                    "Unknown transition {}",
                    other
                )))
            }
        };
        let mut state = self.state.lock().unwrap();
        state
            .transitions
            .push((key.to_string(), transition_id.to_string()));
        find_mut(&mut state.issues, key)?.fields.status = target;
        Ok(())
    }
}

fn find_mut<'a>(issues: &'a mut [JiraIssue], key: &str) -> Result<&'a mut JiraIssue> {
    issues
        .iter_mut()
        .find(|i| i.key == key)
        .ok_or_else(|| MirrorError::Integration(format!("Jira issue not found: {}", key)))
}

#[derive(Debug, Default)]
pub struct GitHubState {
    pub pulls: Vec<GitHubItemDescriptor>,
    pub items: HashMap<u64, GitHubItemDescriptor>,
    pub collaborators: HashSet<String>,
    pub closing: HashMap<u64, Vec<ClosingIssueRef>>,
    pub collaborator_checks: usize,
    pub title_updates: Vec<(u64, String)>,
}

#[derive(Debug, Default)]
pub struct FakeGitHub {
    pub state: Mutex<GitHubState>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collaborators(collaborators: &[&str]) -> Self {
        let github = Self::new();
        github.state.lock().unwrap().collaborators =
            collaborators.iter().map(|c| c.to_string()).collect();
        github
    }

    pub fn add_item(&self, item: GitHubItemDescriptor) {
        let mut state = self.state.lock().unwrap();
        if item.is_pull_request && item.state == ItemState::Open {
            state.pulls.push(item.clone());
        }
        state.items.insert(item.number, item);
    }

    pub fn set_closing(&self, pr: u64, titles: &[(u64, &str)]) {
        self.state.lock().unwrap().closing.insert(
            pr,
            titles
                .iter()
                .map(|(number, title)| ClosingIssueRef {
                    number: *number,
                    title: title.to_string(),
                })
                .collect(),
        );
    }

    pub fn title_updates(&self) -> Vec<(u64, String)> {
        self.state.lock().unwrap().title_updates.clone()
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn is_collaborator(&self, login: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.collaborator_checks += 1;
        Ok(state.collaborators.contains(login))
    }

    async fn list_open_pulls(&self) -> Result<Vec<GitHubItemDescriptor>> {
        let state = self.state.lock().unwrap();
        let mut pulls = state.pulls.clone();
        pulls.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(pulls)
    }

    async fn get_item(&self, number: u64) -> Result<GitHubItemDescriptor> {
        let state = self.state.lock().unwrap();
        state
            .items
            .get(&number)
            .cloned()
            .ok_or_else(|| MirrorError::Integration(format!("Issue not found: #{}", number)))
    }

    async fn closing_issues(&self, pr_number: u64) -> Result<Vec<ClosingIssueRef>> {
        let state = self.state.lock().unwrap();
        Ok(state.closing.get(&pr_number).cloned().unwrap_or_default())
    }

    async fn update_title(&self, number: u64, title: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.title_updates.push((number, title.to_string()));
        if let Some(item) = state.items.get_mut(&number) {
            item.title = title.to_string();
        }
        Ok(())
    }
}
