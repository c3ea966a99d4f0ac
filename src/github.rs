use crate::config::RepoId;
use crate::error::UpstreamFetchError;
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Serialize;
use serde_json::Value;

/// Query parameters attached to a GitHub list request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListParams {
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'static str>,
}

impl ListParams {
    pub fn per_page(per_page: u32) -> Self {
        Self {
            per_page,
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn state(mut self, state: &'static str) -> Self {
        self.state = Some(state);
        self
    }
}

/// The slice of the GitHub REST API this service depends on.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// GETs `route` with `params` and returns the raw JSON payload.
    async fn get_json(&self, route: &str, params: &ListParams) -> Result<Value, UpstreamFetchError>;

    /// Fetches the unified diff of a pull request.
    async fn pull_request_diff(
        &self,
        repo_id: &RepoId,
        pull_number: u64,
    ) -> Result<String, UpstreamFetchError>;
}

/// Like [`GitHubApi::get_json`], but fails unless the payload is a JSON array.
pub async fn get_array(
    api: &dyn GitHubApi,
    route: &str,
    params: &ListParams,
) -> Result<Vec<Value>, UpstreamFetchError> {
    match api.get_json(route, params).await? {
        Value::Array(items) => Ok(items),
        _ => Err(UpstreamFetchError::NotAnArray {
            route: route.to_string(),
        }),
    }
}

/// Cleans a user-supplied path component so it cannot escape its route segment.
pub fn sanitize_segment(raw: &str) -> String {
    let mut segment: String = raw.trim().chars().filter(|c| !matches!(c, '/' | '\\')).collect();
    while segment.contains("..") {
        segment = segment.replace("..", "");
    }
    segment
}

pub fn user_repos_route(username: &str) -> String {
    format!("/users/{}/repos", sanitize_segment(username))
}

pub fn commits_route(repo_id: &RepoId) -> String {
    format!("/repos/{}/{}/commits", repo_id.owner, repo_id.repo)
}

pub fn pulls_route(repo_id: &RepoId) -> String {
    format!("/repos/{}/{}/pulls", repo_id.owner, repo_id.repo)
}

pub struct GitHubClient {
    octocrab: Octocrab,
}

impl GitHubClient {
    pub fn new(token: String) -> anyhow::Result<Self> {
        let octocrab = Octocrab::builder().personal_token(token).build()?;
        Ok(Self { octocrab })
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn get_json(&self, route: &str, params: &ListParams) -> Result<Value, UpstreamFetchError> {
        tracing::debug!(route, page = ?params.page, per_page = params.per_page, "GitHub GET");
        let value: Value = self.octocrab.get(route, Some(params)).await?;
        Ok(value)
    }

    async fn pull_request_diff(
        &self,
        repo_id: &RepoId,
        pull_number: u64,
    ) -> Result<String, UpstreamFetchError> {
        tracing::debug!(repo_id = %repo_id, pull_number, "Fetching pull request diff");
        let diff = self
            .octocrab
            .pulls(repo_id.owner.clone(), repo_id.repo.clone())
            .get_diff(pull_number)
            .await?;
        Ok(diff)
    }
}
