// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client the browser-facing layer uses to reach the backend service.
//!
//! Every request carries the shared secret in `x-internal-token`. Responses
//! are handed back raw so routes can pass successful JSON through unchanged.

use crate::config::INTERNAL_TOKEN_HEADER;
use crate::models::{UpsertUserRequest, UpsertUserResponse};
use axum::body::Bytes;
use axum::http::StatusCode;
use reqwest::Method;
use serde::Serialize;
use uuid::Uuid;

/// Status and body of a backend answer, success or not.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl BackendResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached or did not answer in time.
    #[error("Backend request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Backend response could not be decoded: {0}")]
    Decode(String),
}

/// Backend service client.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    internal_token: String,
}

impl BackendClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, internal_token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            internal_token: internal_token.into(),
        }
    }

    /// Send one request and return the answer whatever its status.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<BackendResponse, BackendError> {
        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path))
            .header(INTERNAL_TOKEN_HEADER, &self.internal_token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(method = %method, path, error = %e, "Backend unreachable");
            BackendError::Transport(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(method = %method, path, status = status.as_u16(), "Backend returned error");
        }
        Ok(BackendResponse { status, body })
    }

    pub async fn get(&self, path: &str) -> Result<BackendResponse, BackendError> {
        self.send::<()>(Method::GET, path, &[], None).await
    }

    /// `POST /auth/google/upsert`.
    pub async fn upsert_google_user(
        &self,
        request: &UpsertUserRequest,
    ) -> Result<UpsertUserResponse, BackendError> {
        let response = self
            .send(Method::POST, "/auth/google/upsert", &[], Some(request))
            .await?;
        if !response.is_success() {
            return Err(BackendError::Status {
                status: response.status,
                body: response.text(),
            });
        }
        serde_json::from_slice(&response.body).map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// `GET /projects/{id}`.
    pub async fn get_project(&self, project_id: Uuid) -> Result<BackendResponse, BackendError> {
        self.get(&format!("/projects/{}", project_id)).await
    }
}
