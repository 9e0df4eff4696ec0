// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Project routes.

use crate::error::{AppError, Result};
use crate::models::{CreateProjectRequest, ListProjectsQuery, Project, ProjectType};
use crate::routes::extract::{parse_uuid, validation_message, ApiJson};
use crate::ApiState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/{project_id}", get(get_project))
}

/// Create a project. Every check runs before the insert.
async fn create_project(
    State(state): State<Arc<ApiState>>,
    ApiJson(request): ApiJson<CreateProjectRequest>,
) -> Result<Json<Project>> {
    if let Err(e) = request.validate() {
        return Err(AppError::BadRequest(validation_message(&e)));
    }

    let project_type: ProjectType = request
        .project_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Project type is required".into()))?
        .parse()
        .map_err(AppError::BadRequest)?;

    let user_id = request
        .user_id
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("userId is required".into()))
        .and_then(|raw| parse_uuid(raw, "userId"))?;

    if state.db.get_user(user_id).await?.is_none() {
        return Err(AppError::BadRequest(format!("User {} does not exist", user_id)));
    }

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let project = state
        .db
        .insert_project(user_id, request.name.trim(), description, project_type)
        .await?;

    tracing::info!(
        project_id = %project.id,
        user_id = %user_id,
        project_type = %project_type,
        "Created project"
    );
    Ok(Json(project))
}

/// Projects of one user, newest first.
async fn list_projects(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<Vec<Project>>> {
    let raw = query
        .user_id
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("userId is required".into()))?;
    let user_id = parse_uuid(raw, "userId")?;

    Ok(Json(state.db.list_projects_for_user(user_id).await?))
}

async fn get_project(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
) -> Result<Json<Project>> {
    let project_id = parse_uuid(&project_id, "project id")?;
    state
        .db
        .get_project(project_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))
}
