// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared-secret authentication for backend routes.

use crate::config::INTERNAL_TOKEN_HEADER;
use crate::error::AppError;
use crate::ApiState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Require `x-internal-token` to match the configured secret.
pub async fn require_internal_token(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(INTERNAL_TOKEN_HEADER)
        .map(|h| h.as_bytes())
        .unwrap_or_default();

    if !token_matches(presented, state.config.internal_token.as_bytes()) {
        tracing::warn!(
            path = %request.uri().path(),
            present = !presented.is_empty(),
            "Rejected backend request with bad internal token"
        );
        return AppError::Unauthorized.into_response();
    }

    next.run(request).await
}

fn token_matches(presented: &[u8], expected: &[u8]) -> bool {
    !expected.is_empty() && presented.ct_eq(expected).into()
}
