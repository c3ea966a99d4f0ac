//! Request handlers for the GitHub, AI and workspace routes.

use crate::config::RepoId;
use crate::context::normalize_context;
use crate::error::ApiError;
use crate::fetcher;
use crate::github::{self, ListParams};
use crate::metrics::{self, CycleTimeReport, PullRequestRecord};
use crate::prompt::{self, PromptMode};
use crate::workspaces::Workspace;
use crate::AppState;
use axum::{
    extract::{FromRequest, FromRequestParts, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub fn github_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/repos", get(get_repos))
        .route("/commits", get(get_commits))
        .route("/prs", get(get_pull_request_metrics))
        .route("/ai-chat", post(coach_chat))
}

pub fn ai_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat))
        .route("/summarize", post(summarize))
        .route("/summarize-pr", post(summarize_pull_request))
}

/// `Json` body whose rejections render as a 400 `{ "error": ... }`.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `Query` string whose rejections render as a 400 `{ "error": ... }`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// Treats missing and blank parameters the same way.
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A sanitized path segment, or `None` when nothing usable is left.
fn path_segment(value: Option<String>) -> Option<String> {
    required(value)
        .map(|v| github::sanitize_segment(&v))
        .filter(|s| !s.is_empty() && s != ".")
}

fn required_repo(owner: Option<String>, repo: Option<String>) -> Result<RepoId, ApiError> {
    match (path_segment(owner), path_segment(repo)) {
        (Some(owner), Some(repo)) => Ok(RepoId { owner, repo }),
        _ => Err(ApiError::bad_request("owner and repo required")),
    }
}

/// Accepts a JSON number or a numeric string; anything else counts as missing.
fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
pub struct ReposQuery {
    username: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn get_repos(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<ReposQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let username =
        path_segment(query.username).ok_or_else(|| ApiError::bad_request("Username required"))?;

    let route = github::user_repos_route(&username);
    let repos = fetcher::fetch_all_pages(state.github.as_ref(), &route, state.config.repos_per_page)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch repos", e))?;

    tracing::debug!(repos = repos.len(), "Returning repos");
    Ok(Json(repos))
}

#[derive(Debug, Deserialize)]
pub struct CommitsQuery {
    owner: Option<String>,
    repo: Option<String>,
    per_page: Option<u32>,
}

#[tracing::instrument(skip(state))]
pub async fn get_commits(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<CommitsQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let repo_id = required_repo(query.owner, query.repo)?;
    let per_page = query.per_page.unwrap_or(state.config.commits_per_page);

    let commits = github::get_array(
        state.github.as_ref(),
        &github::commits_route(&repo_id),
        &ListParams::per_page(per_page),
    )
    .await
    .map_err(|e| ApiError::internal("Failed to fetch commits", e))?;

    tracing::debug!(repo_id = %repo_id, commits = commits.len(), "Returning commits");
    Ok(Json(commits))
}

#[derive(Debug, Deserialize)]
pub struct PullRequestsQuery {
    owner: Option<String>,
    repo: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn get_pull_request_metrics(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<PullRequestsQuery>,
) -> Result<Json<CycleTimeReport>, ApiError> {
    let repo_id = required_repo(query.owner, query.repo)?;

    let items = github::get_array(
        state.github.as_ref(),
        &github::pulls_route(&repo_id),
        &ListParams::per_page(state.config.prs_per_page).state("all"),
    )
    .await
    .map_err(|e| ApiError::internal("Failed to fetch pull requests", e))?;

    let pull_requests: Vec<PullRequestRecord> = serde_json::from_value(Value::Array(items))
        .map_err(|e| ApiError::internal("Failed to fetch pull requests", e))?;

    let report = metrics::compute_cycle_metrics(&pull_requests);
    tracing::debug!(
        repo_id = %repo_id,
        total = report.total_prs,
        closed = report.total_closed_prs,
        avg_cycle_days = %report.avg_cycle_days,
        "Returning cycle metrics"
    );
    Ok(Json(report))
}

#[derive(Serialize)]
pub struct ReplyResponse {
    reply: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    user_query: Option<String>,
    #[serde(default)]
    context: Value,
}

#[tracing::instrument(skip_all)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<ChatRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let user_query =
        required(body.user_query).ok_or_else(|| ApiError::bad_request("userQuery required"))?;

    tracing::debug!(context = %body.context, "AI context received");
    let ctx = normalize_context(&body.context);
    let messages = state
        .policy
        .build_messages(&ctx, &user_query, PromptMode::Chat);

    let reply = state
        .assistant
        .dispatch(&messages)
        .await
        .map_err(|e| ApiError::internal("AI failed to respond", e))?;

    Ok(Json(ReplyResponse {
        reply: reply.content,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    context: Value,
}

#[tracing::instrument(skip_all)]
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<SummarizeRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let ctx = normalize_context(&body.context);
    tracing::debug!(repo = %ctx.repo_name, "Building developer digest");
    let messages = state.policy.build_messages(&ctx, "", PromptMode::Summarize);

    let reply = state
        .assistant
        .dispatch(&messages)
        .await
        .map_err(|e| ApiError::internal("Summary generation failed", e))?;

    Ok(Json(ReplyResponse {
        reply: reply.content,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizePullRequest {
    owner: Option<String>,
    repo: Option<String>,
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pull_number: Option<u64>,
}

#[derive(Serialize)]
pub struct PullRequestSummary {
    success: bool,
    summary: String,
}

#[tracing::instrument(skip(state))]
pub async fn summarize_pull_request(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<SummarizePullRequest>,
) -> Result<Json<PullRequestSummary>, ApiError> {
    let (repo_id, pull_number) = match (required_repo(body.owner, body.repo), body.pull_number) {
        (Ok(repo_id), Some(pull_number)) => (repo_id, pull_number),
        _ => return Err(ApiError::bad_request("owner, repo and pullNumber required")),
    };

    let diff = state
        .github
        .pull_request_diff(&repo_id, pull_number)
        .await
        .map_err(|e| ApiError::internal_with_details("Code analysis failed", e))?;

    let messages = state.policy.build_diff_review_messages(&diff);
    let reply = state
        .assistant
        .dispatch(&messages)
        .await
        .map_err(|e| ApiError::internal_with_details("Code analysis failed", e))?;

    tracing::debug!(repo_id = %repo_id, pull_number, diff_bytes = diff.len(), "Summarized pull request");
    Ok(Json(PullRequestSummary {
        success: true,
        summary: reply.content,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CoachRequest {
    question: Option<String>,
    username: Option<String>,
}

#[derive(Serialize)]
pub struct CoachResponse {
    answer: String,
    model: String,
}

#[tracing::instrument(skip(state))]
pub async fn coach_chat(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<CoachRequest>,
) -> Result<Json<CoachResponse>, ApiError> {
    let question =
        required(body.question).ok_or_else(|| ApiError::bad_request("question required"))?;
    let username = required(body.username).unwrap_or_else(|| "unknown".to_string());

    let messages = prompt::build_coach_messages(&username, &question);
    let reply = state
        .coach
        .dispatch(&messages)
        .await
        .map_err(|e| ApiError::internal("AI coach failed to respond", e))?;

    Ok(Json(CoachResponse {
        answer: reply.content.trim().to_string(),
        model: reply.model,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SaveWorkspaceRequest {
    username: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn save_workspace(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<SaveWorkspaceRequest>,
) -> Result<Json<Workspace>, ApiError> {
    let username =
        required(body.username).ok_or_else(|| ApiError::bad_request("username required"))?;

    let workspace = state
        .workspaces
        .save(username.trim())
        .await
        .map_err(|e| ApiError::internal("Failed to save workspace", e))?;

    tracing::info!(username = %workspace.username, id = workspace.id, "Saved workspace");
    Ok(Json(workspace))
}

pub async fn list_workspaces(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Workspace>>, ApiError> {
    let workspaces = state
        .workspaces
        .list_all()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch workspaces", e))?;
    Ok(Json(workspaces))
}
