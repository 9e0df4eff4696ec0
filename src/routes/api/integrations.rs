// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration routes: registry schemas, create, connect, update and
//! masked credential re-display.

use crate::error::Result;
use crate::models::{
    ConnectIntegrationRequest, CreateIntegrationRequest, CredentialView, Integration,
    UpdateIntegrationRequest,
};
use crate::registry::{IntegrationKind, IntegrationSchema};
use crate::routes::extract::{parse_uuid, ApiJson};
use crate::ApiState;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/integrations/schemas", get(list_schemas))
        .route(
            "/projects/{project_id}/integrations",
            get(list_integrations).post(create_integration),
        )
        .route(
            "/projects/{project_id}/integrations/connect",
            post(connect_integration),
        )
        .route(
            "/projects/{project_id}/integrations/update",
            put(update_integration),
        )
        .route(
            "/projects/{project_id}/integrations/credentials/{integration_type}",
            get(get_credentials),
        )
}

/// Registry of supported integrations, for dynamic forms.
async fn list_schemas() -> Json<Vec<IntegrationSchema>> {
    Json(IntegrationKind::ALL.iter().map(|k| k.schema()).collect())
}

async fn list_integrations(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Integration>>> {
    let project_id = parse_uuid(&project_id, "project id")?;
    Ok(Json(state.integrations.list(project_id).await?))
}

async fn create_integration(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
    ApiJson(request): ApiJson<CreateIntegrationRequest>,
) -> Result<Json<Integration>> {
    let project_id = parse_uuid(&project_id, "project id")?;
    Ok(Json(
        state.integrations.create_pending(project_id, &request).await?,
    ))
}

async fn connect_integration(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
    ApiJson(request): ApiJson<ConnectIntegrationRequest>,
) -> Result<Json<Integration>> {
    let project_id = parse_uuid(&project_id, "project id")?;
    Ok(Json(state.integrations.connect(project_id, &request).await?))
}

async fn update_integration(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
    ApiJson(request): ApiJson<UpdateIntegrationRequest>,
) -> Result<Json<Integration>> {
    let project_id = parse_uuid(&project_id, "project id")?;
    Ok(Json(state.integrations.update(project_id, &request).await?))
}

/// Stored credentials with secrets masked.
async fn get_credentials(
    State(state): State<Arc<ApiState>>,
    Path((project_id, integration_type)): Path<(String, String)>,
) -> Result<Json<BTreeMap<&'static str, CredentialView>>> {
    let project_id = parse_uuid(&project_id, "project id")?;
    Ok(Json(
        state
            .integrations
            .credentials_view(project_id, &integration_type)
            .await?,
    ))
}
