// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Threadspace backend service.
//!
//! Owns users, projects and integrations, and talks to Vercel and AWS on
//! behalf of connected projects. Only reachable with the internal token.

use std::sync::Arc;
use threadspace::{
    config::ApiConfig,
    db::Database,
    services::{http_client, AwsClient, IntegrationService, SecretBox, VercelClient},
    ApiState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = ApiConfig::from_env()?;
    tracing::info!(port = config.port, "Starting Threadspace API");

    let db = Database::connect(&config.database_url).await?;
    let secrets = SecretBox::new(&config.credential_key)?;

    // One pooled client shared by every provider adapter
    let http = http_client(config.provider_timeout)?;
    let vercel = VercelClient::new(http.clone(), config.vercel_api_base.clone());
    let aws = AwsClient::new(http, config.aws_endpoint_url.clone());
    if let Some(endpoint) = &config.aws_endpoint_url {
        tracing::info!(endpoint = %endpoint, "Using AWS endpoint override");
    }

    let integrations = IntegrationService::new(db.clone(), secrets, vercel, aws);

    let state = Arc::new(ApiState {
        config: config.clone(),
        db,
        integrations,
    });

    let app = threadspace::routes::create_api_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
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
