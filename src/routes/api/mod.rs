// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend service routes. Every route here sits behind the shared-secret
//! middleware applied in `routes/mod.rs`.

pub mod auth;
pub mod integrations;
pub mod projects;
pub mod summaries;

use crate::ApiState;
use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .merge(auth::routes())
        .merge(projects::routes())
        .merge(integrations::routes())
        .merge(summaries::routes())
}
