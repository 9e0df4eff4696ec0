// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP routers for the backend service and the browser-facing layer.

pub mod api;
pub mod extract;
pub mod web;

use crate::middleware::security::{apply_security_headers, SecurityHeaders};
use crate::middleware::{require_internal_token, require_session};
use crate::{ApiState, WebState};
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use reqwest::Url;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, HttpMakeClassifier, TraceLayer,
};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// True when `candidate` has the same scheme, host and port as `base`.
pub(crate) fn same_origin(candidate: &str, base: &str) -> bool {
    match (Url::parse(candidate), Url::parse(base)) {
        (Ok(candidate), Ok(base)) => {
            candidate.username().is_empty()
                && candidate.password().is_none()
                && candidate.origin() == base.origin()
        }
        _ => false,
    }
}

/// CORS origins: the frontend, or plain-http localhost on any port.
fn allowed_origin(origin: &str, frontend_url: &str) -> bool {
    if same_origin(origin, frontend_url) {
        return true;
    }
    Url::parse(origin).is_ok_and(|url| {
        url.scheme() == "http" && matches!(url.host_str(), Some("localhost" | "127.0.0.1"))
    })
}

fn trace_layer(
) -> TraceLayer<HttpMakeClassifier, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}

/// Build the backend service router.
///
/// Everything except `/health` requires the shared internal token.
pub fn create_api_router(state: Arc<ApiState>) -> Router {
    let protected_routes = api::routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_internal_token,
    ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(
            SecurityHeaders::backend(),
            apply_security_headers,
        ))
        .layer(trace_layer())
        .with_state(state)
}

/// Build the browser-facing router.
pub fn create_web_router(state: Arc<WebState>) -> Router {
    // Allow the configured frontend plus localhost for development
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| allowed_origin(origin, &frontend_url))
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(web::auth::routes());

    let protected_routes = web::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(
            SecurityHeaders::browser(state.config.secure_cookies()),
            apply_security_headers,
        ))
        .layer(cors)
        .layer(trace_layer())
        .with_state(state)
}
