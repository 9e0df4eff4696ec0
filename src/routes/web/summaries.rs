// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser-facing provider summary routes.

use super::{owned_project, relay};
use crate::error::WebError;
use crate::middleware::SessionUser;
use crate::WebState;
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Extension, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<WebState>> {
    Router::new()
        .route("/api/projects/{id}/vercel/summary", get(vercel_summary))
        .route("/api/projects/{id}/aws/s3/metrics", get(s3_metrics))
        .route("/api/projects/{id}/aws/s3/buckets", get(s3_buckets))
        .route("/api/projects/{id}/aws/rds/metrics", get(rds_metrics))
        .route("/api/projects/{id}/aws/rds/instances", get(rds_instances))
}

/// Check ownership, then relay `GET /projects/{id}{suffix}` from the backend.
async fn forward_summary(
    state: &WebState,
    user: &SessionUser,
    id: &str,
    suffix: &str,
    fallback: &str,
) -> Result<Response, WebError> {
    let project = owned_project(state, user, id).await?;
    let path = format!("/projects/{}{}", project.id, suffix);
    Ok(relay(state.backend.get(&path).await, fallback))
}

async fn vercel_summary(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    forward_summary(&state, &user, &id, "/vercel/summary", "Failed to load Vercel summary").await
}

async fn s3_metrics(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    forward_summary(&state, &user, &id, "/aws/s3/metrics", "Failed to load S3 metrics").await
}

async fn s3_buckets(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    forward_summary(&state, &user, &id, "/aws/s3/buckets", "Failed to load S3 buckets").await
}

async fn rds_metrics(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    forward_summary(&state, &user, &id, "/aws/rds/metrics", "Failed to load RDS metrics").await
}

async fn rds_instances(
    State(state): State<Arc<WebState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    forward_summary(&state, &user, &id, "/aws/rds/instances", "Failed to load RDS instances").await
}
