// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Threadspace: a multi-tenant dashboard for project infrastructure.
//!
//! Two services live in this crate. `threadspace-api` owns users, projects
//! and integrations, stores sealed provider credentials and produces Vercel
//! and AWS summaries. `threadspace-web` handles Google sign-in and sessions
//! and forwards browser calls to the backend with a shared secret.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod registry;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::{ApiConfig, WebConfig};
use db::Database;
use services::{BackendClient, GoogleOAuthClient, IntegrationService};

/// Shared state of the backend service.
pub struct ApiState {
    pub config: ApiConfig,
    pub db: Database,
    pub integrations: IntegrationService,
}

/// Shared state of the browser-facing layer.
pub struct WebState {
    pub config: WebConfig,
    pub backend: BackendClient,
    pub google: GoogleOAuthClient,
}
