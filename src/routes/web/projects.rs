// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser-facing project routes.

use super::{owned_project, relay};
use crate::error::WebError;
use crate::middleware::SessionUser;
use crate::models::{CreateProjectRequest, Project};
use crate::routes::extract::WebJson;
use crate::WebState;
use axum::{
    extract::{Path, State},
    http::Method,
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<WebState>> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/projects/{id}", get(get_project))
}

/// What the browser sends; the owner comes from the session.
#[derive(Debug, Deserialize)]
struct NewProjectBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "type", default)]
    project_type: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn create_project(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
    WebJson(body): WebJson<NewProjectBody>,
) -> Result<Response, WebError> {
    let name = non_blank(body.name).ok_or_else(|| WebError::bad_request("Project name is required"))?;
    let project_type =
        non_blank(body.project_type).ok_or_else(|| WebError::bad_request("Project type is required"))?;

    let request = CreateProjectRequest {
        name,
        description: non_blank(body.description),
        project_type: Some(project_type),
        user_id: Some(user.id.to_string()),
    };
    let result = state
        .backend
        .send(Method::POST, "/projects", &[], Some(&request))
        .await;
    Ok(relay(result, "Failed to create project"))
}

async fn list_projects(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
) -> Response {
    let user_id = user.id.to_string();
    let result = state
        .backend
        .send::<()>(Method::GET, "/projects", &[("userId", user_id.as_str())], None)
        .await;
    relay(result, "Failed to load projects")
}

async fn get_project(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<Project>, WebError> {
    Ok(Json(owned_project(&state, &user, &id).await?))
}
