// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser-facing integration routes.

use super::{owned_project, relay};
use crate::error::WebError;
use crate::middleware::SessionUser;
use crate::models::{ConnectIntegrationRequest, CreateIntegrationRequest, UpdateIntegrationRequest};
use crate::routes::extract::WebJson;
use crate::WebState;
use axum::{
    extract::{Path, State},
    http::Method,
    response::Response,
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<WebState>> {
    Router::new()
        .route("/api/integrations/schemas", get(list_schemas))
        .route(
            "/api/projects/{id}/integrations",
            get(list_integrations).post(create_integration),
        )
        .route("/api/integrations/{id}/connect", post(connect_integration))
        .route("/api/integrations/{id}/update", put(update_integration))
        .route(
            "/api/integrations/{id}/credentials/{integration_type}",
            get(get_credentials),
        )
}

async fn list_schemas(State(state): State<Arc<WebState>>) -> Response {
    relay(
        state.backend.get("/integrations/schemas").await,
        "Failed to load integrations",
    )
}

async fn list_integrations(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    let project = owned_project(&state, &user, &id).await?;
    let path = format!("/projects/{}/integrations", project.id);
    Ok(relay(
        state.backend.get(&path).await,
        "Failed to load integrations",
    ))
}

async fn create_integration(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    WebJson(body): WebJson<CreateIntegrationRequest>,
) -> Result<Response, WebError> {
    let project = owned_project(&state, &user, &id).await?;
    let path = format!("/projects/{}/integrations", project.id);
    let result = state
        .backend
        .send(Method::POST, &path, &[], Some(&body))
        .await;
    Ok(relay(result, "Failed to create integration"))
}

/// `{id}` is the project id.
async fn connect_integration(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    WebJson(body): WebJson<ConnectIntegrationRequest>,
) -> Result<Response, WebError> {
    let project = owned_project(&state, &user, &id).await?;
    let path = format!("/projects/{}/integrations/connect", project.id);
    let result = state
        .backend
        .send(Method::POST, &path, &[], Some(&body))
        .await;
    Ok(relay(result, "Failed to connect integration"))
}

async fn update_integration(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    WebJson(body): WebJson<UpdateIntegrationRequest>,
) -> Result<Response, WebError> {
    let project = owned_project(&state, &user, &id).await?;
    let path = format!("/projects/{}/integrations/update", project.id);
    let result = state
        .backend
        .send(Method::PUT, &path, &[], Some(&body))
        .await;
    Ok(relay(result, "Failed to update integration"))
}

async fn get_credentials(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
    Path((id, integration_type)): Path<(String, String)>,
) -> Result<Response, WebError> {
    let project = owned_project(&state, &user, &id).await?;
    let path = format!(
        "/projects/{}/integrations/credentials/{}",
        project.id,
        urlencoding::encode(&integration_type)
    );
    Ok(relay(
        state.backend.get(&path).await,
        "Failed to load credentials",
    ))
}
