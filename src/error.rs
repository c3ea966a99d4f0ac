//! Error types shared across the service and their HTTP rendering.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure while reading data from the GitHub API.
#[derive(Debug, Error)]
pub enum UpstreamFetchError {
    #[error("GitHub API request failed: {0}")]
    Request(#[from] octocrab::Error),

    #[error("GitHub API returned a non-array payload for {route}")]
    NotAnArray { route: String },
}

/// Failure while talking to a chat-completion endpoint.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion response has no choices[0].message.content")]
    MissingContent,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// An error returned from a route handler, rendered as `{ "error": ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl ApiError {
    /// A missing or invalid request parameter.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            details: None,
        }
    }

    /// Logs `source` and hides it behind a generic `message`.
    pub fn internal(message: impl Into<String>, source: impl fmt::Display) -> Self {
        let message = message.into();
        tracing::error!(error = %source, "{}", message);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
            details: None,
        }
    }

    /// Like [`ApiError::internal`], but also exposes the source text as `details`.
    pub fn internal_with_details(message: impl Into<String>, source: impl fmt::Display) -> Self {
        let details = source.to_string();
        Self {
            details: Some(details.clone()),
            ..Self::internal(message, details)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}
