// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Two shapes live here:
//! - [`AppError`] is what the backend service answers with: a stable
//!   machine-readable `error` code plus optional user-safe `details`.
//! - [`WebError`] is what the browser-facing layer answers with: a single
//!   `error` message string, reshaped from whatever the backend said.

use crate::services::provider::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Convert a failed live check during `connect` into the error the caller sees.
    ///
    /// Authentication failures become [`AppError::Credentials`] so they are
    /// distinguishable from transient or network failures.
    pub fn from_connect_failure(err: ProviderError) -> Self {
        if err.is_credentials() {
            AppError::Credentials(format!(
                "{} rejected the supplied credentials",
                err.provider
            ))
        } else {
            AppError::Provider(err)
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Credentials(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_credentials",
                Some(msg.clone()),
            ),
            AppError::Provider(err) => {
                tracing::warn!(
                    provider = %err.provider,
                    status = ?err.status,
                    code = ?err.code,
                    message = %err.message,
                    "Provider call failed"
                );
                (err.http_status(), "provider_error", Some(err.user_message()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

// ─── Browser-facing errors ───────────────────────────────────

/// Message shown whenever an upstream error talks about credentials or access.
pub const CREDENTIALS_MESSAGE: &str =
    "Invalid credentials. Please check your access keys and try again.";

const CREDENTIAL_PHRASES: [&str; 3] = ["credentials", "authentication", "access"];

/// Error returned by browser-facing routes: `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    /// Reshape a failed backend response into a single user-facing message.
    ///
    /// Only the backend's `details`/`message` fields are ever surfaced; bodies
    /// that are not JSON fall back to `fallback`.
    pub fn from_upstream(status: StatusCode, body: &str, fallback: &str) -> Self {
        let status = if status.is_client_error() || status.is_server_error() {
            status
        } else {
            StatusCode::BAD_GATEWAY
        };

        let message = upstream_message(body).unwrap_or_else(|| fallback.to_string());
        let message = if mentions_credentials(&message) {
            CREDENTIALS_MESSAGE.to_string()
        } else {
            message
        };

        Self { status, message }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// Whether an upstream message is about credentials, authentication or access.
pub fn mentions_credentials(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    CREDENTIAL_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let details = value
        .get("details")
        .or_else(|| value.get("message"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty());
    if let Some(details) = details {
        return Some(details.to_string());
    }

    // A bare error code is only worth surfacing when it is credential-related.
    value
        .get("error")
        .and_then(|v| v.as_str())
        .filter(|code| mentions_credentials(code))
        .map(str::to_string)
}
