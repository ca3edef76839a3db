//! Jira Integration Adapter
//!
//! Writes mirrored issues, labels, comments and status transitions through the
//! Jira REST API v2.

use super::api::JiraApi;
use crate::config::{JiraAuth, JiraIntegration};
use crate::{MirrorError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Per-request timeout for search/query operations
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-request timeout for single issue and comment fetches
const GET_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request timeout for create/update operations
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

const ISSUE_FIELDS: &str = "summary,description,issuetype,status,labels";

const COMMENT_PAGE_SIZE: u32 = 100;

/// Jira REST client
pub struct JiraAdapter {
    client: Client,
    project: String,
    base_url: String,
    auth: JiraAuth,
}

/// Jira issue representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraIssue {
    pub key: String,
    pub id: String,
    pub fields: JiraFields,
}

/// Jira issue fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraFields {
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "issuetype", default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<JiraIssueType>,
    pub status: JiraStatus,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraIssueType {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraStatus {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "statusCategory", default)]
    pub status_category: Option<JiraStatusCategory>,
}

impl JiraStatus {
    /// Whether the status belongs to Jira's "done" category
    pub fn is_done(&self) -> bool {
        self.status_category
            .as_ref()
            .is_some_and(|category| category.key == "done")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraStatusCategory {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraUser {
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "accountId", default)]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraSearchResponse {
    pub total: u32,
    #[serde(rename = "startAt")]
    pub start_at: u32,
    #[serde(rename = "maxResults")]
    pub max_results: u32,
    pub issues: Vec<JiraIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraTransition {
    pub id: String,
    pub name: String,
    pub to: JiraStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraTransitionsResponse {
    pub transitions: Vec<JiraTransition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraComment {
    pub id: String,
    pub body: String,
    #[serde(default)]
    pub author: Option<JiraUser>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct JiraCommentsResponse {
    #[serde(rename = "startAt", default)]
    start_at: u32,
    #[serde(default)]
    total: u32,
    comments: Vec<JiraComment>,
}

#[derive(Debug, Clone, Deserialize)]
struct JiraCreatedIssue {
    key: String,
}

#[derive(Debug, Clone, Serialize)]
struct JiraCommentBody {
    body: String,
}

#[derive(Debug, Clone, Serialize)]
struct JiraTransitionRequest {
    transition: JiraTransitionId,
}

#[derive(Debug, Clone, Serialize)]
struct JiraTransitionId {
    id: String,
}

/// Fields of an issue about to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJiraIssue {
    pub summary: String,
    pub description: String,
    pub issue_type: String,
    pub labels: Vec<String>,
}

impl JiraAdapter {
    /// Create a new Jira adapter
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &JiraIntegration) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let base_url = format!("{}/rest/api/2", config.url.trim_end_matches('/'));

        Ok(Self {
            client,
            project: config.project.clone(),
            base_url,
            auth: config.auth.clone(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth {
            JiraAuth::Token(ref token) => request.bearer_auth(token),
            JiraAuth::Basic {
                ref user,
                ref password,
            } => request.basic_auth(user, Some(password)),
        }
    }

    /// Turn an unexpected response into an integration error
    async fn failure(response: Response, what: &str) -> MirrorError {
        match response.status() {
            StatusCode::UNAUTHORIZED => {
                MirrorError::Integration("Jira authentication failed".to_string())
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                MirrorError::Integration(format!(
                    "Jira rate limited {}, retry after {} seconds",
                    what, retry_after
                ))
            }
            status => {
                let error_body = response.text().await.unwrap_or_default();
                MirrorError::Integration(format!(
                    "Jira API error {}: HTTP {}: {}",
                    what, status, error_body
                ))
            }
        }
    }

    /// Get a single issue by key
    pub async fn get_issue(&self, key: &str) -> Result<JiraIssue> {
        let url = format!("{}/issue/{}", self.base_url, key);

        debug!(key = %key, "Fetching Jira issue");

        let request = self.client.get(&url).query(&[("fields", ISSUE_FIELDS)]);
        let response = self
            .authorize(request)
            .timeout(GET_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(MirrorError::Integration(format!(
                "Jira issue not found: {}",
                key
            ))),
            _ => Err(Self::failure(response, &format!("fetching {}", key)).await),
        }
    }

    async fn write(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self
            .authorize(request)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(response),
            _ => Err(Self::failure(response, what).await),
        }
    }
}

#[async_trait]
impl JiraApi for JiraAdapter {
    async fn search(
        &self,
        jql: &str,
        start_at: u32,
        max_results: u32,
    ) -> Result<JiraSearchResponse> {
        let url = format!("{}/search", self.base_url);

        let params = [
            ("jql", jql.to_string()),
            ("startAt", start_at.to_string()),
            ("maxResults", max_results.to_string()),
            ("fields", ISSUE_FIELDS.to_string()),
        ];

        debug!(jql = %jql, start_at, max_results, "Searching Jira issues");

        let request = self.client.get(&url).query(&params);
        let response = self
            .authorize(request)
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let search_result: JiraSearchResponse = response.json().await?;
                debug!(
                    total = search_result.total,
                    start_at = search_result.start_at,
                    returned = search_result.issues.len(),
                    "Jira search complete"
                );
                Ok(search_result)
            }
            _ => Err(Self::failure(response, "searching issues").await),
        }
    }

    async fn create_issue(&self, issue: &NewJiraIssue) -> Result<JiraIssue> {
        let url = format!("{}/issue", self.base_url);

        let body = serde_json::json!({
            "fields": {
                "project": { "key": self.project },
                "summary": issue.summary,
                "description": issue.description,
                "issuetype": { "name": issue.issue_type },
                "labels": issue.labels,
            }
        });

        info!(project = %self.project, summary = %issue.summary, "Creating Jira issue");

        let response = self
            .write(self.client.post(&url).json(&body), "creating issue")
            .await?;
        let created: JiraCreatedIssue = response.json().await?;

        info!(key = %created.key, "Jira issue created");

        self.get_issue(&created.key).await
    }

    async fn update_issue(&self, key: &str, summary: &str, description: &str) -> Result<()> {
        let url = format!("{}/issue/{}", self.base_url, key);

        let body = serde_json::json!({
            "fields": {
                "summary": summary,
                "description": description,
            }
        });

        info!(key = %key, "Updating Jira issue summary/description");

        self.write(self.client.put(&url).json(&body), &format!("updating {}", key))
            .await?;
        Ok(())
    }

    async fn set_labels(&self, key: &str, add: &[String], remove: &[String]) -> Result<()> {
        if add.is_empty() && remove.is_empty() {
            return Ok(());
        }

        let url = format!("{}/issue/{}", self.base_url, key);

        let operations: Vec<serde_json::Value> = add
            .iter()
            .map(|label| serde_json::json!({ "add": label }))
            .chain(remove.iter().map(|label| serde_json::json!({ "remove": label })))
            .collect();
        let body = serde_json::json!({ "update": { "labels": operations } });

        info!(key = %key, added = ?add, removed = ?remove, "Updating Jira labels");

        self.write(
            self.client.put(&url).json(&body),
            &format!("updating labels of {}", key),
        )
        .await?;
        Ok(())
    }

    async fn add_remote_link(&self, key: &str, url: &str, title: &str) -> Result<()> {
        let endpoint = format!("{}/issue/{}/remotelink", self.base_url, key);

        let body = serde_json::json!({
            "globalId": url,
            "object": {
                "url": url,
                "title": title,
            }
        });

        debug!(key = %key, url = %url, "Adding Jira remote link");

        self.write(
            self.client.post(&endpoint).json(&body),
            &format!("linking {}", key),
        )
        .await?;
        Ok(())
    }

    async fn get_comments(&self, key: &str) -> Result<Vec<JiraComment>> {
        let url = format!("{}/issue/{}/comment", self.base_url, key);
        let mut comments = Vec::new();

        loop {
            let request = self.client.get(&url).query(&[
                ("startAt", comments.len().to_string()),
                ("maxResults", COMMENT_PAGE_SIZE.to_string()),
            ]);
            let response = self
                .authorize(request)
                .timeout(GET_TIMEOUT)
                .send()
                .await?;

            if response.status() != StatusCode::OK {
                return Err(Self::failure(response, &format!("listing comments of {}", key)).await);
            }

            let page: JiraCommentsResponse = response.json().await?;
            let fetched = page.comments.len();
            let end = page.start_at as usize + fetched;
            comments.extend(page.comments);

            if fetched == 0 || end >= page.total as usize {
                break;
            }
        }

        debug!(key = %key, count = comments.len(), "Fetched Jira comments");
        Ok(comments)
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<JiraComment> {
        let url = format!("{}/issue/{}/comment", self.base_url, key);

        info!(key = %key, "Adding comment to Jira issue");

        let request = self.client.post(&url).json(&JiraCommentBody {
            body: body.to_string(),
        });
        let response = self
            .write(request, &format!("commenting on {}", key))
            .await?;
        Ok(response.json().await?)
    }

    async fn update_comment(&self, key: &str, comment_id: &str, body: &str) -> Result<()> {
        let url = format!("{}/issue/{}/comment/{}", self.base_url, key, comment_id);

        info!(key = %key, comment_id = %comment_id, "Updating Jira comment");

        let request = self.client.put(&url).json(&JiraCommentBody {
            body: body.to_string(),
        });
        self.write(request, &format!("updating comment {} on {}", comment_id, key))
            .await?;
        Ok(())
    }

    async fn delete_comment(&self, key: &str, comment_id: &str) -> Result<()> {
        let url = format!("{}/issue/{}/comment/{}", self.base_url, key, comment_id);

        info!(key = %key, comment_id = %comment_id, "Deleting Jira comment");

        self.write(
            self.client.delete(&url),
            &format!("deleting comment {} on {}", comment_id, key),
        )
        .await?;
        Ok(())
    }

    async fn get_transitions(&self, key: &str) -> Result<Vec<JiraTransition>> {
        let url = format!("{}/issue/{}/transitions", self.base_url, key);

        let response = self
            .authorize(self.client.get(&url))
            .timeout(GET_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let result: JiraTransitionsResponse = response.json().await?;
                Ok(result.transitions)
            }
            _ => Err(Self::failure(response, &format!("listing transitions of {}", key)).await),
        }
    }

    async fn transition_status(&self, key: &str, transition_id: &str) -> Result<()> {
        let url = format!("{}/issue/{}/transitions", self.base_url, key);

        let body = JiraTransitionRequest {
            transition: JiraTransitionId {
                id: transition_id.to_string(),
            },
        };

        info!(key = %key, transition_id = %transition_id, "Transitioning Jira issue");

        self.write(
            self.client.post(&url).json(&body),
            &format!("transitioning {}", key),
        )
        .await?;
        Ok(())
    }
}
