//! Web error types for the relay server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::replay::{RegistryError, SinkError};
use crate::scenario::ScenarioError;
use crate::search::SearchError;

/// Error type for web API operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with validation error.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A remote service failed or answered with something unusable.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Conflict error (e.g., resource state mismatch).
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", Some(msg.clone())),
            WebError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad Request", Some(msg.clone()))
            }
            WebError::Internal(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    None,
                )
            }
            WebError::Upstream(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch remote",
                    Some(msg.clone()),
                )
            }
            WebError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> Self {
        WebError::Internal(err.to_string())
    }
}

impl From<SearchError> for WebError {
    fn from(err: SearchError) -> Self {
        if err.is_input_error() {
            WebError::BadRequest(err.to_string())
        } else {
            WebError::Upstream(err.to_string())
        }
    }
}

impl From<ScenarioError> for WebError {
    fn from(err: ScenarioError) -> Self {
        match err {
            ScenarioError::InvalidName(_) => WebError::BadRequest(err.to_string()),
            ScenarioError::NotFound(_) => WebError::NotFound(err.to_string()),
            ScenarioError::AlreadyExists(_) => WebError::Conflict(err.to_string()),
            ScenarioError::Io { .. } | ScenarioError::Parse(_) => {
                WebError::Internal(err.to_string())
            }
        }
    }
}

impl From<RegistryError> for WebError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => WebError::NotFound(err.to_string()),
            RegistryError::AlreadySubscribed(_) | RegistryError::Busy { .. } => {
                WebError::Conflict(err.to_string())
            }
        }
    }
}

impl From<SinkError> for WebError {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Client(_) => WebError::Internal(err.to_string()),
            _ => WebError::BadRequest(err.to_string()),
        }
    }
}
