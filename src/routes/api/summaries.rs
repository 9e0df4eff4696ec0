// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live provider summaries for a project's connected integrations.

use crate::error::{AppError, Result};
use crate::routes::extract::parse_uuid;
use crate::services::aws::{RdsInstanceInfo, RdsMetrics, S3BucketInfo, S3Metrics};
use crate::services::vercel::{VercelAuth, VercelSummary};
use crate::ApiState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/projects/{project_id}/vercel/summary", get(vercel_summary))
        .route("/projects/{project_id}/aws/s3/buckets", get(s3_buckets))
        .route("/projects/{project_id}/aws/s3/metrics", get(s3_metrics))
        .route("/projects/{project_id}/aws/rds/instances", get(rds_instances))
        .route("/projects/{project_id}/aws/rds/metrics", get(rds_metrics))
        .route("/api/integrations/vercel/summary", get(server_vercel_summary))
}

async fn vercel_summary(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
) -> Result<Json<VercelSummary>> {
    let project_id = parse_uuid(&project_id, "project id")?;
    Ok(Json(state.integrations.vercel_summary(project_id).await?))
}

async fn s3_buckets(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<S3BucketInfo>>> {
    let project_id = parse_uuid(&project_id, "project id")?;
    Ok(Json(state.integrations.s3_buckets(project_id).await?))
}

async fn s3_metrics(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
) -> Result<Json<S3Metrics>> {
    let project_id = parse_uuid(&project_id, "project id")?;
    Ok(Json(state.integrations.s3_metrics(project_id).await?))
}

async fn rds_instances(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<RdsInstanceInfo>>> {
    let project_id = parse_uuid(&project_id, "project id")?;
    Ok(Json(state.integrations.rds_instances(project_id).await?))
}

async fn rds_metrics(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
) -> Result<Json<RdsMetrics>> {
    let project_id = parse_uuid(&project_id, "project id")?;
    Ok(Json(state.integrations.rds_metrics(project_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerSummaryQuery {
    project: Option<String>,
    team_id: Option<String>,
}

/// Vercel summary using the server-wide `VERCEL_TOKEN` instead of stored
/// project credentials.
async fn server_vercel_summary(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ServerSummaryQuery>,
) -> Result<Json<VercelSummary>> {
    let Some(token) = state.config.vercel_token.clone() else {
        tracing::warn!("Server Vercel summary requested but VERCEL_TOKEN is not set");
        return Err(AppError::Unauthorized);
    };
    let project = query
        .project
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("project query parameter is required".into()))?;

    let auth = VercelAuth {
        token,
        team_id: query.team_id.filter(|t| !t.trim().is_empty()),
    };
    Ok(Json(
        state.integrations.vercel().get_summary(&auth, project).await?,
    ))
}
