// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Each binary loads its own configuration once at startup. A `.env` file is
//! honored for local development.

use std::env;
use std::time::Duration;

/// Header carrying the shared secret between the web layer and the backend.
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 15;

/// Configuration for the backend service (`threadspace-api`).
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server port
    pub port: u16,
    /// sqlx connection string
    pub database_url: String,
    /// Shared secret every caller must present in `x-internal-token`
    pub internal_token: String,
    /// Master secret for sealing integration credentials at rest
    pub credential_key: Vec<u8>,
    /// Vercel REST API base URL
    pub vercel_api_base: String,
    /// Server-wide Vercel token for the unscoped summary route
    pub vercel_token: Option<String>,
    /// Endpoint override for every AWS service (local stacks, tests)
    pub aws_endpoint_url: Option<String>,
    /// Timeout applied to every outbound provider call
    pub provider_timeout: Duration,
}

impl ApiConfig {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8081,
            database_url: "sqlite::memory:".to_string(),
            internal_token: "test_internal_token".to_string(),
            credential_key: b"test_credential_key_32_bytes_min".to_vec(),
            vercel_api_base: "https://api.vercel.com".to_string(),
            vercel_token: None,
            aws_endpoint_url: None,
            provider_timeout: Duration::from_secs(5),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: parse_port("8081"),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://threadspace.db?mode=rwc".to_string()),
            internal_token: required_trimmed("INTERNAL_SYNC_TOKEN")?,
            credential_key: required_trimmed("CREDENTIAL_ENCRYPTION_KEY")?.into_bytes(),
            vercel_api_base: env::var("VERCEL_API_BASE")
                .unwrap_or_else(|_| "https://api.vercel.com".to_string()),
            vercel_token: optional_trimmed("VERCEL_TOKEN"),
            aws_endpoint_url: optional_trimmed("AWS_ENDPOINT_URL"),
            provider_timeout: parse_timeout("PROVIDER_TIMEOUT_SECS"),
        })
    }
}

/// Configuration for the browser-facing layer (`threadspace-web`).
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server port
    pub port: u16,
    /// Public base URL of this service (used for the OAuth callback)
    pub public_url: String,
    /// Frontend URL for CORS and post-login redirects
    pub frontend_url: String,
    /// Base URL of the backend service
    pub backend_base: String,
    /// Shared secret sent to the backend in `x-internal-token`
    pub internal_token: String,
    /// HS256 key for session tokens
    pub session_secret: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_userinfo_url: String,
    /// Timeout applied to backend and Google calls
    pub request_timeout: Duration,
}

impl WebConfig {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            public_url: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            backend_base: "http://localhost:8081".to_string(),
            internal_token: "test_internal_token".to_string(),
            session_secret: b"test_session_key_32_bytes_minimum".to_vec(),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
            google_client_id: "test_client_id".to_string(),
            google_client_secret: "test_client_secret".to_string(),
            google_auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            google_token_url: "https://oauth2.googleapis.com/token".to_string(),
            google_userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let session_secret = required_trimmed("SESSION_SECRET")?.into_bytes();
        let oauth_state_key = optional_trimmed("OAUTH_STATE_KEY")
            .map(String::into_bytes)
            .unwrap_or_else(|| session_secret.clone());

        Ok(Self {
            port: parse_port("8080"),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            backend_base: env::var("BACKEND_BASE")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            internal_token: required_trimmed("INTERNAL_SYNC_TOKEN")?,
            session_secret,
            oauth_state_key,
            google_client_id: required_trimmed("GOOGLE_CLIENT_ID")?,
            google_client_secret: required_trimmed("GOOGLE_CLIENT_SECRET")?,
            google_auth_url: env::var("GOOGLE_AUTH_URL")
                .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/v2/auth".to_string()),
            google_token_url: env::var("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string()),
            google_userinfo_url: env::var("GOOGLE_USERINFO_URL").unwrap_or_else(|_| {
                "https://openidconnect.googleapis.com/v1/userinfo".to_string()
            }),
            request_timeout: parse_timeout("REQUEST_TIMEOUT_SECS"),
        })
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

fn parse_port(default: &str) -> u16 {
    env::var("PORT")
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| default.parse().unwrap_or(8080))
}

fn parse_timeout(name: &str) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

fn required_trimmed(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional_trimmed(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
