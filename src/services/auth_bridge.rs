// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth bridge: binds a Google session to an internal user row.
//!
//! Runs whenever a session token lacks `uid`. Once `uid` is present the
//! bridge never calls the backend again for that token; profile changes are
//! picked up on the next fresh sign-in, which always starts without `uid`.

use crate::middleware::session::SessionClaims;
use crate::models::UpsertUserRequest;
use crate::services::backend_client::BackendClient;

/// Attach the internal user id to `claims` if it is missing.
///
/// Returns `true` when `claims` changed and the token must be re-issued.
/// Backend failures are logged and leave `claims` untouched.
pub async fn ensure_internal_user(backend: &BackendClient, claims: &mut SessionClaims) -> bool {
    if claims.uid.is_some() {
        return false;
    }

    let request = UpsertUserRequest {
        provider_id: claims.sub.clone(),
        email: claims.email.clone(),
        name: claims.name.clone(),
    };

    match backend.upsert_google_user(&request).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Session bound to internal user");
            claims.uid = Some(user.id);
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "User sync with backend failed");
            false
        }
    }
}
