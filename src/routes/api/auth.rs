// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User upsert called by the auth bridge.

use crate::error::{AppError, Result};
use crate::models::{UpsertUserRequest, UpsertUserResponse};
use crate::routes::extract::{validation_message, ApiJson};
use crate::ApiState;
use axum::{extract::State, routing::post, Json, Router};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new().route("/auth/google/upsert", post(upsert_google_user))
}

/// Insert or refresh the user keyed by Google's subject id.
async fn upsert_google_user(
    State(state): State<Arc<ApiState>>,
    ApiJson(request): ApiJson<UpsertUserRequest>,
) -> Result<Json<UpsertUserResponse>> {
    if let Err(e) = request.validate() {
        return Err(AppError::BadRequest(validation_message(&e)));
    }

    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let user = state
        .db
        .upsert_google_user(request.provider_id.trim(), request.email.trim(), name)
        .await?;

    tracing::info!(user_id = %user.id, "Upserted Google user");
    Ok(Json(UpsertUserResponse::from(&user)))
}
