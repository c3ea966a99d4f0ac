//! Application configuration and environment variable parsing.
//!
//! This module handles loading configuration settings from the environment (e.g., .env file).
//! It defines the `AppConfig` struct which holds the upstream credentials, the frontend origin
//! allowed by CORS, and the endpoint/page-size settings used when talking to GitHub and to the
//! chat-completion providers.

use serde::Deserialize;
use std::fmt;

/// A unique identifier for a GitHub repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoId {
    /// The owner of the repository (e.g., "facebook").
    pub owner: String,
    /// The name of the repository (e.g., "react").
    pub repo: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// GitHub Personal Access Token used for every GitHub request.
    #[serde(alias = "github_pat")]
    pub github_token: String,

    /// API key for the primary chat-completion endpoint (Groq).
    pub groq_api_key: String,

    /// Optional API key for the coach endpoint (Perplexity) behind `/ai-chat`.
    /// When unset, the coach route is answered by the primary endpoint.
    #[serde(default)]
    pub perplexity_api_key: Option<String>,

    /// The dashboard origin allowed to make credentialed cross-origin requests.
    pub frontend_url: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_groq_api_url")]
    pub groq_api_url: String,

    #[serde(default = "default_groq_model")]
    pub groq_model: String,

    #[serde(default = "default_perplexity_api_url")]
    pub perplexity_api_url: String,

    #[serde(default = "default_perplexity_model")]
    pub perplexity_model: String,

    /// Number of pull requests requested for the cycle-time route (single page).
    #[serde(default = "default_prs_per_page")]
    pub prs_per_page: u32,

    /// Default number of commits when the caller does not pass `per_page`.
    #[serde(default = "default_commits_per_page")]
    pub commits_per_page: u32,

    /// Page size used while paginating a user's repositories.
    #[serde(default = "default_repos_per_page")]
    pub repos_per_page: u32,
}

fn default_port() -> u16 {
    5000
}

fn default_groq_api_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_groq_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_perplexity_api_url() -> String {
    "https://api.perplexity.ai/chat/completions".to_string()
}

fn default_perplexity_model() -> String {
    "llama-3.1-sonar-small-128k-online".to_string()
}

fn default_prs_per_page() -> u32 {
    50
}

fn default_commits_per_page() -> u32 {
    30
}

fn default_repos_per_page() -> u32 {
    100
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Builds a configuration with the given required values and every optional
    /// setting at its default.
    pub fn new(
        github_token: impl Into<String>,
        groq_api_key: impl Into<String>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            github_token: github_token.into(),
            groq_api_key: groq_api_key.into(),
            perplexity_api_key: None,
            frontend_url: frontend_url.into(),
            port: default_port(),
            groq_api_url: default_groq_api_url(),
            groq_model: default_groq_model(),
            perplexity_api_url: default_perplexity_api_url(),
            perplexity_model: default_perplexity_model(),
            prs_per_page: default_prs_per_page(),
            commits_per_page: default_commits_per_page(),
            repos_per_page: default_repos_per_page(),
        }
    }
}
