//! Dispatch of prompt messages to OpenAI-compatible chat-completion endpoints.

use crate::error::CompletionError;
use crate::prompt::ChatMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The text of a completion and the model that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    pub model: String,
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Sends `messages` once and returns the first choice's content.
    async fn dispatch(&self, messages: &[ChatMessage]) -> Result<ChatReply, CompletionError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    model: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<MessageContent>,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

impl ChatResponse {
    fn into_reply(self, requested_model: &str) -> Result<ChatReply, CompletionError> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or(CompletionError::MissingContent)?;

        Ok(ChatReply {
            content,
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
        })
    }
}

/// A chat-completion endpoint speaking the OpenAI wire format (Groq, Perplexity).
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleClient {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiCompatibleClient {
    async fn dispatch(&self, messages: &[ChatMessage]) -> Result<ChatReply, CompletionError> {
        tracing::debug!(url = %self.url, model = %self.model, messages = messages.len(), "Dispatching completion");

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                messages,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed.into_reply(&self.model)
    }
}
