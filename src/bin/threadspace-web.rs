// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Threadspace browser-facing layer.
//!
//! Handles Google sign-in and session cookies, and forwards every dashboard
//! call to the backend service with the shared internal token.

use std::sync::Arc;
use threadspace::{
    config::WebConfig,
    services::{http_client, BackendClient, GoogleOAuthClient},
    WebState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = WebConfig::from_env()?;
    tracing::info!(
        port = config.port,
        backend = %config.backend_base,
        "Starting Threadspace web"
    );

    let http = http_client(config.request_timeout)?;
    let backend = BackendClient::new(
        http.clone(),
        config.backend_base.clone(),
        config.internal_token.clone(),
    );
    let google = GoogleOAuthClient::new(http, &config);

    let state = Arc::new(WebState {
        config: config.clone(),
        backend,
        google,
    });

    let app = threadspace::routes::create_web_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("threadspace=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
