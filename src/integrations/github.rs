//! GitHub Integration Adapter
//!
//! Repository reads and the pull request title write-back go through the REST
//! API; closing-issue references are only exposed by the GraphQL API.

use super::api::GitHubApi;
use crate::config::GitHubIntegration;
use crate::model::{ClosingIssueRef, GitHubItemDescriptor, ItemPayload};
use crate::{MirrorError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Per-request timeout for GraphQL queries
const GRAPHQL_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-request timeout for single reads
const GET_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request timeout for updates
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

const PULLS_PAGE_SIZE: usize = 100;

/// GitHub only returns the first page of this connection; there is no
/// pagination over closing references.
const CLOSING_ISSUES_QUERY: &str = r#"
    query($owner: String!, $repo: String!, $pr: Int!) {
        repository(owner: $owner, name: $repo) {
            pullRequest(number: $pr) {
                closingIssuesReferences(first: 10) {
                    nodes {
                        number
                        title
                    }
                }
            }
        }
    }
"#;

/// GitHub API client bound to one repository
pub struct GitHubAdapter {
    client: Client,
    owner: String,
    repo: String,
    rest_base_url: String,
    graphql_url: String,
    auth_token: Option<String>,
}

/// GraphQL response wrapper
#[derive(Debug, Clone, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ClosingIssuesData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Clone, Deserialize)]
struct RepositoryNode {
    #[serde(rename = "pullRequest")]
    pull_request: Option<PullRequestNode>,
}

#[derive(Debug, Clone, Deserialize)]
struct PullRequestNode {
    #[serde(rename = "closingIssuesReferences")]
    closing_issues_references: ClosingIssuesConnection,
}

#[derive(Debug, Clone, Deserialize)]
struct ClosingIssuesConnection {
    nodes: Vec<ClosingIssueRef>,
}

#[derive(Debug, Clone, Serialize)]
struct UpdateTitleRequest<'a> {
    title: &'a str,
}

impl GitHubAdapter {
    /// Create a new GitHub adapter
    ///
    /// Returns an error if the repository is not `owner/name` or the HTTP
    /// client cannot be created.
    pub fn new(config: &GitHubIntegration) -> Result<Self> {
        let (owner, repo) = config.owner_and_name().ok_or_else(|| {
            MirrorError::Config(format!(
                "Invalid repository '{}': expected owner/name",
                config.repository
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static(concat!(
                        "jira-mirror/",
                        env!("CARGO_PKG_VERSION")
                    )),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/vnd.github+json"),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            owner: owner.to_string(),
            repo: repo.to_string(),
            rest_base_url: config.api_url.trim_end_matches('/').to_string(),
            graphql_url: config.graphql_url.clone(),
            auth_token: config.token.clone(),
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.rest_base_url, self.owner, self.repo, path
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn failure(response: Response, what: &str) -> MirrorError {
        match response.status() {
            StatusCode::UNAUTHORIZED => {
                MirrorError::Integration("GitHub authentication failed".to_string())
            }
            StatusCode::FORBIDDEN => MirrorError::Integration(format!(
                "GitHub API forbidden {} (rate limit or missing permission?)",
                what
            )),
            status => {
                let error_body = response.text().await.unwrap_or_default();
                MirrorError::Integration(format!(
                    "GitHub API error {}: HTTP {}: {}",
                    what, status, error_body
                ))
            }
        }
    }

    /// Execute a GraphQL query
    async fn graphql<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let request = self.client.post(&self.graphql_url).json(&body);
        let response = self
            .authorize(request)
            .timeout(GRAPHQL_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let result: GraphQLResponse<T> = response.json().await?;
                if let Some(errors) = result.errors {
                    let error_msg = errors
                        .iter()
                        .map(|e| e.message.clone())
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(MirrorError::Integration(format!(
                        "GraphQL error: {}",
                        error_msg
                    )));
                }
                result.data.ok_or_else(|| {
                    MirrorError::Integration("No data in GraphQL response".to_string())
                })
            }
            _ => Err(Self::failure(response, "running GraphQL query").await),
        }
    }
}

#[async_trait]
impl GitHubApi for GitHubAdapter {
    async fn is_collaborator(&self, login: &str) -> Result<bool> {
        let url = self.repo_url(&format!("collaborators/{}", urlencoding::encode(login)));

        let response = self
            .authorize(self.client.get(&url))
            .timeout(GET_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::failure(response, &format!("checking collaborator {}", login)).await),
        }
    }

    async fn list_open_pulls(&self) -> Result<Vec<GitHubItemDescriptor>> {
        let url = self.repo_url("pulls");
        let mut pulls = Vec::new();
        let mut page = 1u32;

        loop {
            let request = self.client.get(&url).query(&[
                ("state", "open".to_string()),
                ("sort", "created".to_string()),
                ("direction", "desc".to_string()),
                ("per_page", PULLS_PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ]);
            let response = self
                .authorize(request)
                .timeout(GET_TIMEOUT)
                .send()
                .await?;

            if response.status() != StatusCode::OK {
                return Err(Self::failure(response, "listing open pull requests").await);
            }

            let batch: Vec<ItemPayload> = response.json().await?;
            let fetched = batch.len();
            pulls.extend(batch.into_iter().map(GitHubItemDescriptor::from_pull_request));

            if fetched < PULLS_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        info!(count = pulls.len(), "Listed open pull requests");
        Ok(pulls)
    }

    async fn get_item(&self, number: u64) -> Result<GitHubItemDescriptor> {
        let url = self.repo_url(&format!("issues/{}", number));

        debug!(number = number, "Fetching GitHub issue");

        let response = self
            .authorize(self.client.get(&url))
            .timeout(GET_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let payload: ItemPayload = response.json().await?;
                Ok(GitHubItemDescriptor::from_issue(payload))
            }
            StatusCode::NOT_FOUND => Err(MirrorError::Integration(format!(
                "Issue not found: {}/{}#{}",
                self.owner, self.repo, number
            ))),
            _ => Err(Self::failure(response, &format!("fetching #{}", number)).await),
        }
    }

    async fn closing_issues(&self, pr_number: u64) -> Result<Vec<ClosingIssueRef>> {
        let variables = serde_json::json!({
            "owner": self.owner,
            "repo": self.repo,
            "pr": pr_number,
        });

        debug!(pr = pr_number, "Querying closing issue references");

        let data: ClosingIssuesData = self.graphql(CLOSING_ISSUES_QUERY, variables).await?;
        let pull_request = data
            .repository
            .and_then(|r| r.pull_request)
            .ok_or_else(|| {
                MirrorError::Integration(format!(
                    "Pull request not found: {}/{}#{}",
                    self.owner, self.repo, pr_number
                ))
            })?;

        Ok(pull_request.closing_issues_references.nodes)
    }

    async fn update_title(&self, number: u64, title: &str) -> Result<()> {
        let url = self.repo_url(&format!("issues/{}", number));

        info!(number = number, title = %title, "Updating GitHub title");

        let request = self.client.patch(&url).json(&UpdateTitleRequest { title });
        let response = self
            .authorize(request)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            _ => Err(Self::failure(response, &format!("updating title of #{}", number)).await),
        }
    }
}
