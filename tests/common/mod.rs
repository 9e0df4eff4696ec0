// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    extract::Path,
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use threadspace::config::{ApiConfig, WebConfig, INTERNAL_TOKEN_HEADER};
use threadspace::db::Database;
use threadspace::middleware::session::{create_session_token, SessionClaims};
use threadspace::models::{Project, ProjectType, User};
use threadspace::routes::{create_api_router, create_web_router};
use threadspace::services::{
    AwsClient, BackendClient, GoogleOAuthClient, GoogleProfile, IntegrationService, SecretBox,
    VercelClient,
};
use threadspace::{ApiState, WebState};
use tower::ServiceExt;
use uuid::Uuid;

pub const VERCEL_TOKEN: &str = "vercel_good_token";
pub const AWS_ACCESS_KEY: &str = "AKIAGOODKEY12345";
/// Accepted by S3 but denied by RDS and CloudWatch.
pub const AWS_S3_ONLY_KEY: &str = "AKIAS3ONLYKEY678";

/// Serve `router` on an ephemeral port and return its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL of a local port with nothing listening on it.
pub async fn closed_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// ─── Fake Vercel ─────────────────────────────────────────────

fn vercel_authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {}", VERCEL_TOKEN).as_str())
}

fn vercel_forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"error": {"code": "forbidden", "message": "Not authorized"}})),
    )
        .into_response()
}

async fn vercel_project(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !vercel_authorized(&headers) {
        return vercel_forbidden();
    }
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"code": "not_found", "message": "Project not found"}})),
        )
            .into_response();
    }
    Json(json!({
        "id": "prj_123",
        "name": id,
        "framework": "nextjs",
        "createdAt": 1_700_000_000_000i64,
        "link": {"type": "github", "org": "acme", "repo": "site"}
    }))
    .into_response()
}

async fn vercel_deployments(headers: HeaderMap) -> Response {
    if !vercel_authorized(&headers) {
        return vercel_forbidden();
    }
    Json(json!({
        "deployments": [{
            "uid": "dpl_1",
            "url": "site-abc.vercel.app",
            "state": "READY",
            "target": "production",
            "created": 1_700_000_000_000i64
        }]
    }))
    .into_response()
}

async fn vercel_domains(headers: HeaderMap) -> Response {
    if !vercel_authorized(&headers) {
        return vercel_forbidden();
    }
    Json(json!({"domains": [{"name": "acme.dev", "verified": true, "primary": true}]}))
        .into_response()
}

async fn vercel_env(headers: HeaderMap) -> Response {
    if !vercel_authorized(&headers) {
        return vercel_forbidden();
    }
    Json(json!({
        "envs": [
            {"key": "DATABASE_URL", "target": ["production"], "value": "postgres://secret"},
            {"key": "NEXT_PUBLIC_SITE", "target": "production", "value": "https://acme.dev"}
        ]
    }))
    .into_response()
}

pub fn fake_vercel() -> Router {
    Router::new()
        .route("/v9/projects/{id}", get(vercel_project))
        .route("/v6/deployments", get(vercel_deployments))
        .route("/v9/projects/{id}/domains", get(vercel_domains))
        .route("/v10/projects/{id}/env", get(vercel_env))
}

// ─── Fake AWS (S3, RDS and CloudWatch behind one endpoint) ───

const S3_DENIED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>InvalidAccessKeyId</Code><Message>The AWS Access Key Id you provided does not exist in our records.</Message></Error>"#;

const LIST_BUCKETS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Owner><ID>abc</ID></Owner>
  <Buckets>
    <Bucket><Name>assets</Name><CreationDate>2024-01-15T10:30:00.000Z</CreationDate></Bucket>
    <Bucket><Name>logs</Name><CreationDate>2024-03-01T00:00:00.000Z</CreationDate></Bucket>
  </Buckets>
</ListAllMyBucketsResult>"#;

const LIST_ASSETS: &str = r#"<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>assets</Name>
  <KeyCount>2</KeyCount>
  <MaxKeys>1000</MaxKeys>
  <IsTruncated>false</IsTruncated>
  <Contents><Key>a.png</Key><Size>100</Size></Contents>
  <Contents><Key>b.png</Key><Size>250</Size></Contents>
</ListBucketResult>"#;

const RDS_DENIED: &str = r#"<ErrorResponse xmlns="http://rds.amazonaws.com/doc/2014-10-31/">
  <Error><Type>Sender</Type><Code>AccessDenied</Code><Message>User is not authorized to perform rds:DescribeDBInstances</Message></Error>
  <RequestId>1</RequestId>
</ErrorResponse>"#;

const S3_INTERNAL: &str =
    "<Error><Code>InternalError</Code><Message>We encountered an internal error.</Message></Error>";

const DESCRIBE_DB: &str = r#"<DescribeDBInstancesResponse xmlns="http://rds.amazonaws.com/doc/2014-10-31/">
  <DescribeDBInstancesResult>
    <DBInstances>
      <DBInstance>
        <DBInstanceIdentifier>main-db</DBInstanceIdentifier>
        <DBInstanceClass>db.t3.micro</DBInstanceClass>
        <Engine>postgres</Engine>
        <EngineVersion>16.3</EngineVersion>
        <DBInstanceStatus>available</DBInstanceStatus>
        <AllocatedStorage>20</AllocatedStorage>
        <MultiAZ>false</MultiAZ>
        <AvailabilityZone>us-east-1a</AvailabilityZone>
      </DBInstance>
    </DBInstances>
  </DescribeDBInstancesResult>
</DescribeDBInstancesResponse>"#;

const METRIC_STATS: &str = r#"<GetMetricStatisticsResponse xmlns="http://monitoring.amazonaws.com/doc/2010-08-01/">
  <GetMetricStatisticsResult>
    <Datapoints>
      <member><Timestamp>2026-10-19T02:00:00Z</Timestamp><Average>30.0</Average></member>
      <member><Timestamp>2026-10-19T01:00:00Z</Timestamp><Average>10.0</Average></member>
    </Datapoints>
    <Label>Metric</Label>
  </GetMetricStatisticsResult>
</GetMetricStatisticsResponse>"#;

fn xml(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

async fn fake_aws_handler(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let s3_only = authorization.contains(&format!("Credential={}/", AWS_S3_ONLY_KEY));
    if !s3_only && !authorization.contains(&format!("Credential={}/", AWS_ACCESS_KEY)) {
        return xml(StatusCode::FORBIDDEN, S3_DENIED);
    }

    let path = uri.path();
    if method == Method::GET {
        return match path {
            "/" => xml(StatusCode::OK, LIST_BUCKETS),
            "/assets" => xml(StatusCode::OK, LIST_ASSETS),
            _ => xml(StatusCode::INTERNAL_SERVER_ERROR, S3_INTERNAL),
        };
    }
    if s3_only {
        xml(StatusCode::FORBIDDEN, RDS_DENIED)
    } else if body.contains("Action=DescribeDBInstances") {
        xml(StatusCode::OK, DESCRIBE_DB)
    } else if body.contains("Action=GetMetricStatistics") {
        xml(StatusCode::OK, METRIC_STATS)
    } else {
        xml(StatusCode::BAD_REQUEST, S3_INTERNAL)
    }
}

pub fn fake_aws() -> Router {
    Router::new().fallback(fake_aws_handler)
}

// ─── Fake Google ─────────────────────────────────────────────

pub const GOOGLE_CODE: &str = "google-auth-code";
const GOOGLE_ACCESS_TOKEN: &str = "google-access-token";

async fn google_token(body: String) -> Response {
    if !body.contains(&format!("code={}", GOOGLE_CODE)) {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"}))).into_response();
    }
    Json(json!({"access_token": GOOGLE_ACCESS_TOKEN, "token_type": "Bearer"})).into_response()
}

async fn google_userinfo(headers: HeaderMap) -> Response {
    let expected = format!("Bearer {}", GOOGLE_ACCESS_TOKEN);
    if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"sub": "google-42", "email": "grace@example.com", "name": "Grace"})).into_response()
}

pub fn fake_google() -> Router {
    Router::new()
        .route("/token", post(google_token))
        .route("/userinfo", get(google_userinfo))
}

// ─── Apps ────────────────────────────────────────────────────

/// Backend app wired to fake Vercel and AWS servers and an in-memory database.
pub async fn create_api_app() -> (Router, Arc<ApiState>) {
    let vercel_base = spawn_server(fake_vercel()).await;
    let aws_base = spawn_server(fake_aws()).await;
    create_api_app_with(vercel_base, aws_base).await
}

/// Backend app talking to the given Vercel and AWS base URLs.
pub async fn create_api_app_with(vercel_base: String, aws_base: String) -> (Router, Arc<ApiState>) {
    let mut config = ApiConfig::test_default();
    config.vercel_api_base = vercel_base.clone();
    config.aws_endpoint_url = Some(aws_base.clone());

    let db = Database::in_memory().await.unwrap();
    let http = reqwest::Client::new();
    let integrations = IntegrationService::new(
        db.clone(),
        SecretBox::new(&config.credential_key).unwrap(),
        VercelClient::new(http.clone(), vercel_base),
        AwsClient::new(http, Some(aws_base)),
    );

    let state = Arc::new(ApiState {
        config,
        db,
        integrations,
    });
    (create_api_router(state.clone()), state)
}

/// Browser-facing app in front of a real backend served on an ephemeral port.
pub async fn create_web_app() -> (Router, Arc<WebState>, Arc<ApiState>) {
    let (api_app, api_state) = create_api_app().await;
    let backend_base = spawn_server(api_app).await;
    let google_base = spawn_server(fake_google()).await;

    let mut config = WebConfig::test_default();
    config.backend_base = backend_base.clone();
    config.google_auth_url = format!("{}/authorize", google_base);
    config.google_token_url = format!("{}/token", google_base);
    config.google_userinfo_url = format!("{}/userinfo", google_base);

    let http = reqwest::Client::new();
    let state = Arc::new(WebState {
        backend: BackendClient::new(http.clone(), backend_base, config.internal_token.clone()),
        google: GoogleOAuthClient::new(http, &config),
        config,
    });
    (create_web_router(state.clone()), state, api_state)
}

// ─── Fixtures ────────────────────────────────────────────────

pub async fn seed_user(db: &Database, sub: &str, email: &str) -> User {
    db.upsert_google_user(sub, email, None).await.unwrap()
}

pub async fn seed_project(db: &Database, user_id: Uuid, name: &str) -> Project {
    db.insert_project(user_id, name, None, ProjectType::Web)
        .await
        .unwrap()
}

pub fn vercel_credentials() -> Value {
    json!({"apiToken": VERCEL_TOKEN, "projectName": "acme-site"})
}

pub fn aws_credentials() -> Value {
    json!({
        "accessKeyId": AWS_ACCESS_KEY,
        "secretAccessKey": "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
        "region": "us-east-1"
    })
}

/// Session token for a signed-in Google account, optionally already bound.
pub fn session_token(state: &WebState, sub: &str, email: &str, uid: Option<Uuid>) -> String {
    session_token_signed_with(&state.config.session_secret, sub, email, uid)
}

pub fn session_token_signed_with(key: &[u8], sub: &str, email: &str, uid: Option<Uuid>) -> String {
    let mut claims = SessionClaims::for_profile(&GoogleProfile {
        sub: sub.to_string(),
        email: email.to_string(),
        name: None,
    })
    .unwrap();
    claims.uid = uid;
    create_session_token(&claims, key).unwrap()
}

// ─── Requests ────────────────────────────────────────────────

pub fn internal_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(INTERNAL_TOKEN_HEADER, "test_internal_token");
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn session_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("threadspace_session={}", token));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send one request and return status plus JSON body (`Null` when empty).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
