// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser-facing route tests. Each test runs the web router in front of a
//! real backend served on a local port.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use threadspace::error::CREDENTIALS_MESSAGE;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_api_routes_require_a_session() {
    let (app, _, _) = common::create_web_app().await;

    let request = Request::builder().uri("/api/projects").body(Body::empty()).unwrap();
    let (status, body) = common::send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn test_forged_session_is_rejected() {
    let (app, _, api) = common::create_web_app().await;
    let user = common::seed_user(&api.db, "g-1", "ada@example.com").await;

    let token = common::session_token_signed_with(
        b"some_other_session_key_entirely",
        "g-1",
        "ada@example.com",
        Some(user.id),
    );
    let (status, _) =
        common::send(&app, common::session_request("GET", "/api/me", &token, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_with_bound_session() {
    let (app, web, api) = common::create_web_app().await;
    let user = common::seed_user(&api.db, "g-1", "ada@example.com").await;
    let token = common::session_token(&web, "g-1", "ada@example.com", Some(user.id));

    let (status, body) =
        common::send(&app, common::session_request("GET", "/api/me", &token, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.id.to_string());
    assert_eq!(body["email"], "ada@example.com");
}

#[tokio::test]
async fn test_bearer_token_is_accepted() {
    let (app, web, api) = common::create_web_app().await;
    let user = common::seed_user(&api.db, "g-1", "ada@example.com").await;
    let token = common::session_token(&web, "g-1", "ada@example.com", Some(user.id));

    let request = Request::builder()
        .uri("/api/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = common::send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_project_uses_session_user() {
    let (app, web, api) = common::create_web_app().await;
    let user = common::seed_user(&api.db, "g-1", "ada@example.com").await;
    let token = common::session_token(&web, "g-1", "ada@example.com", Some(user.id));

    let request = common::session_request(
        "POST",
        "/api/projects",
        &token,
        Some(json!({"name": "Acme", "type": "web"})),
    );
    let (status, body) = common::send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "web");
    assert_eq!(body["userId"], user.id.to_string());

    let (status, listed) =
        common::send(&app, common::session_request("GET", "/api/projects", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_project_errors_are_reshaped() {
    let (app, web, api) = common::create_web_app().await;
    let user = common::seed_user(&api.db, "g-1", "ada@example.com").await;
    let token = common::session_token(&web, "g-1", "ada@example.com", Some(user.id));

    let request = common::session_request(
        "POST",
        "/api/projects",
        &token,
        Some(json!({"name": "   ", "type": "web"})),
    );
    let (status, body) = common::send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Project name is required"}));

    // Too short passes the BFF check and is rejected by the backend
    let request = common::session_request(
        "POST",
        "/api/projects",
        &token,
        Some(json!({"name": "A", "type": "web"})),
    );
    let (status, body) = common::send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Project name must be between 2 and 100 characters"})
    );
}

#[tokio::test]
async fn test_invalid_json_body() {
    let (app, web, api) = common::create_web_app().await;
    let user = common::seed_user(&api.db, "g-1", "ada@example.com").await;
    let token = common::session_token(&web, "g-1", "ada@example.com", Some(user.id));

    let request = Request::builder()
        .method("POST")
        .uri("/api/projects")
        .header(header::COOKIE, format!("threadspace_session={}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = common::send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid JSON body"}));
}

#[tokio::test]
async fn test_other_users_project_looks_missing() {
    let (app, web, api) = common::create_web_app().await;
    let ada = common::seed_user(&api.db, "g-1", "ada@example.com").await;
    let bob = common::seed_user(&api.db, "g-2", "bob@example.com").await;
    let bobs = common::seed_project(&api.db, bob.id, "Bob's").await;
    let token = common::session_token(&web, "g-1", "ada@example.com", Some(ada.id));

    for uri in [
        format!("/api/projects/{}", bobs.id),
        format!("/api/projects/{}/integrations", bobs.id),
        format!("/api/projects/{}/aws/s3/metrics", bobs.id),
    ] {
        let (status, body) =
            common::send(&app, common::session_request("GET", &uri, &token, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body, json!({"error": "Project not found"}));
    }

    let (status, _) = common::send(
        &app,
        common::session_request("GET", "/api/projects/not-a-uuid", &token, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rejected_aws_keys_get_friendly_message() {
    let (app, web, api) = common::create_web_app().await;
    let user = common::seed_user(&api.db, "g-1", "ada@example.com").await;
    let project = common::seed_project(&api.db, user.id, "Acme").await;
    let token = common::session_token(&web, "g-1", "ada@example.com", Some(user.id));

    let request = common::session_request(
        "POST",
        &format!("/api/integrations/{}/connect", project.id),
        &token,
        Some(json!({
            "integrationType": "AWS",
            "credentials": {"accessKeyId": "bad", "secretAccessKey": "bad", "region": "us-east-1"}
        })),
    );
    let (status, body) = common::send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": CREDENTIALS_MESSAGE}));
    assert_eq!(api.db.count_integrations().await.unwrap(), 0);
}

#[tokio::test]
async fn test_connect_then_summary_through_the_bff() {
    let (app, web, api) = common::create_web_app().await;
    let user = common::seed_user(&api.db, "g-1", "ada@example.com").await;
    let project = common::seed_project(&api.db, user.id, "Acme").await;
    let token = common::session_token(&web, "g-1", "ada@example.com", Some(user.id));

    let request = common::session_request(
        "POST",
        &format!("/api/integrations/{}/connect", project.id),
        &token,
        Some(json!({"integrationType": "vercel", "credentials": common::vercel_credentials()})),
    );
    let (status, body) = common::send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CONNECTED");

    let uri = format!("/api/projects/{}/vercel/summary", project.id);
    let (status, summary) =
        common::send(&app, common::session_request("GET", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["project"]["name"], "acme-site");

    let uri = format!("/api/integrations/{}/credentials/vercel", project.id);
    let (status, view) =
        common::send(&app, common::session_request("GET", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["apiToken"]["state"], "set");
    assert!(!view.to_string().contains(common::VERCEL_TOKEN));
}

#[tokio::test]
async fn test_schemas_are_forwarded() {
    let (app, web, api) = common::create_web_app().await;
    let user = common::seed_user(&api.db, "g-1", "ada@example.com").await;
    let token = common::session_token(&web, "g-1", "ada@example.com", Some(user.id));

    let (status, body) = common::send(
        &app,
        common::session_request("GET", "/api/integrations/schemas", &token, None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_security_headers_present() {
    let (app, _, _) = common::create_web_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["cache-control"], "no-store");
}

#[tokio::test]
async fn test_cors_only_trusts_exact_local_origins() {
    let (app, _, _) = common::create_web_app().await;

    for (origin, allowed) in [
        ("http://localhost:3000", true),
        ("http://127.0.0.1:5173", true),
        ("http://localhost.evil.com", false),
        ("http://localhost:3000.evil.com", false),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let allow_origin = response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN);
        assert_eq!(allow_origin.is_some(), allowed, "{}", origin);
        if allowed {
            assert_eq!(allow_origin.unwrap(), origin);
        }
    }
}
