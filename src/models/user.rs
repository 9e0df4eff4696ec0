// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Identity provider recorded for every user row.
pub const GOOGLE_PROVIDER: &str = "google";

/// User row, keyed internally by `id` and externally by `provider_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// OAuth provider name (always "google" today)
    pub provider: String,
    /// Provider-issued subject id (unique)
    pub provider_id: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Body of `POST /auth/google/upsert`, also sent by the web layer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUserRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "providerId is required"))]
    pub provider_id: String,
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertUserResponse {
    pub id: Uuid,
    pub email: String,
}

impl From<&User> for UpsertUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}
