// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser-facing routes. Each one authenticates the session, forwards to the
//! backend with the shared secret, and reshapes failures into
//! `{"error": "<message>"}`.

pub mod auth;
pub mod integrations;
pub mod projects;
pub mod summaries;

use crate::error::WebError;
use crate::middleware::SessionUser;
use crate::models::Project;
use crate::services::backend_client::{BackendError, BackendResponse};
use crate::WebState;
use axum::{
    http::header,
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

/// Routes that require a session bound to an internal user.
pub fn protected_routes() -> Router<Arc<WebState>> {
    Router::new()
        .merge(auth::session_routes())
        .merge(projects::routes())
        .merge(integrations::routes())
        .merge(summaries::routes())
}

/// Turn a backend answer into the browser response.
///
/// Successful JSON passes through byte for byte. Failures keep the backend
/// status but only ever expose a single reshaped message.
pub(crate) fn relay(result: Result<BackendResponse, BackendError>, fallback: &str) -> Response {
    match result {
        Ok(response) if response.is_success() => (
            response.status,
            [(header::CONTENT_TYPE, "application/json")],
            response.body,
        )
            .into_response(),
        Ok(response) => {
            WebError::from_upstream(response.status, &response.text(), fallback).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Backend call failed");
            WebError::internal().into_response()
        }
    }
}

/// Fetch a project and make sure it belongs to the session user.
///
/// Someone else's project is reported exactly like a missing one.
pub(crate) async fn owned_project(
    state: &WebState,
    user: &SessionUser,
    raw_id: &str,
) -> Result<Project, WebError> {
    let not_found = || WebError::not_found("Project not found");
    let project_id = Uuid::parse_str(raw_id.trim()).map_err(|_| not_found())?;

    let response = state.backend.get_project(project_id).await.map_err(|e| {
        tracing::error!(error = %e, "Backend call failed");
        WebError::internal()
    })?;
    if !response.is_success() {
        return Err(WebError::from_upstream(
            response.status,
            &response.text(),
            "Failed to load project",
        ));
    }

    let project: Project = serde_json::from_slice(&response.body).map_err(|e| {
        tracing::error!(error = %e, "Backend returned an unreadable project");
        WebError::internal()
    })?;
    if project.user_id != user.id {
        tracing::warn!(
            project_id = %project.id,
            user_id = %user.id,
            "Blocked access to another user's project"
        );
        return Err(not_found());
    }
    Ok(project)
}
