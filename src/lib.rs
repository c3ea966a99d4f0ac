pub mod completion;
pub mod config;
pub mod context;
pub mod error;
pub mod fetcher;
pub mod github;
pub mod metrics;
pub mod prompt;
pub mod routes;
pub mod workspaces;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use completion::{ChatCompletion, OpenAiCompatibleClient};
use config::AppConfig;
use github::{GitHubApi, GitHubClient};
use prompt::PromptPolicy;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use workspaces::{InMemoryWorkspaceStore, WorkspaceStore};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    message: &'static str,
    version: &'static str,
}

/// Shared application state accessible to all request handlers.
pub struct AppState {
    /// Application configuration loaded from environment variables.
    pub config: AppConfig,
    /// GitHub REST API client.
    pub github: Arc<dyn GitHubApi>,
    /// Completion endpoint for the dashboard assistant, digest and diff review.
    pub assistant: Arc<dyn ChatCompletion>,
    /// Completion endpoint for the developer coach route.
    pub coach: Arc<dyn ChatCompletion>,
    pub workspaces: Arc<dyn WorkspaceStore>,
    pub policy: PromptPolicy,
}

impl AppState {
    /// Initializes the application state with the production clients.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let github = Arc::new(GitHubClient::new(config.github_token.clone())?);
        let assistant: Arc<dyn ChatCompletion> = Arc::new(OpenAiCompatibleClient::new(
            &config.groq_api_url,
            &config.groq_api_key,
            &config.groq_model,
        ));
        let coach: Arc<dyn ChatCompletion> = match &config.perplexity_api_key {
            Some(key) => Arc::new(OpenAiCompatibleClient::new(
                &config.perplexity_api_url,
                key,
                &config.perplexity_model,
            )),
            None => {
                tracing::warn!("PERPLEXITY_API_KEY not set; /ai-chat uses the primary endpoint");
                assistant.clone()
            }
        };

        Ok(Self::with_clients(
            config,
            github,
            assistant,
            coach,
            Arc::new(InMemoryWorkspaceStore::new()),
        ))
    }

    /// Builds the state around caller-supplied collaborators.
    pub fn with_clients(
        config: AppConfig,
        github: Arc<dyn GitHubApi>,
        assistant: Arc<dyn ChatCompletion>,
        coach: Arc<dyn ChatCompletion>,
        workspaces: Arc<dyn WorkspaceStore>,
    ) -> Self {
        Self {
            config,
            github,
            assistant,
            coach,
            workspaces,
            policy: PromptPolicy::default(),
        }
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        .route("/", get(health_check))
        .route(
            "/api/workspaces",
            get(routes::list_workspaces).post(routes::save_workspace),
        )
        .nest("/api/github", routes::github_router())
        .nest("/api/ai", routes::ai_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Allows credentialed requests from the frontend origin only.
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Invalid FRONTEND_URL '{}': {}. Cross-origin requests are disabled.", frontend_url, e);
            layer
        }
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online",
        message: "AI Backend is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}
