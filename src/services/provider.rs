// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed failures from third-party provider APIs.

use axum::http::StatusCode;
use std::fmt;

/// AWS error codes that mean the supplied keys (or role) were rejected.
const AWS_AUTH_CODES: [&str; 9] = [
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
    "AccessDenied",
    "AccessDeniedException",
    "AuthFailure",
    "ExpiredToken",
    "InvalidToken",
];

const AUTH_PHRASES: [&str; 4] = [
    "credential",
    "authenticat",
    "access denied",
    "invalid token",
];

/// Third-party APIs the services talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Vercel,
    Aws,
    Google,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Vercel => "Vercel",
            Provider::Aws => "AWS",
            Provider::Google => "Google",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The provider rejected the credentials (bad key, revoked token, denied).
    Credentials,
    NotFound,
    RateLimited,
    /// Could not reach the provider at all (DNS, connect, timeout).
    Network,
    /// Anything else the provider answered with, including malformed bodies.
    Upstream,
}

/// A failed provider call, carrying the upstream status when there was one.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{provider} API error: {message}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
    pub status: Option<u16>,
    pub code: Option<String>,
    /// Raw upstream message. Logged, never sent to browsers.
    pub message: String,
}

impl ProviderError {
    /// Classify a non-success HTTP answer from a provider.
    pub fn from_status(
        provider: Provider,
        status: u16,
        code: Option<String>,
        message: String,
    ) -> Self {
        let kind = classify(status, code.as_deref(), &message);
        Self {
            provider,
            kind,
            status: Some(status),
            code,
            message,
        }
    }

    /// The provider could not be reached or did not answer in time.
    pub fn network(provider: Provider, err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        Self {
            provider,
            kind: ProviderErrorKind::Network,
            status: None,
            code: None,
            message,
        }
    }

    /// The provider answered 2xx but the body was not what we expected.
    pub fn malformed(provider: Provider, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind: ProviderErrorKind::Upstream,
            status: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn is_credentials(&self) -> bool {
        self.kind == ProviderErrorKind::Credentials
    }

    /// Status the backend answers with for this failure.
    pub fn http_status(&self) -> StatusCode {
        match self.kind {
            ProviderErrorKind::Credentials => StatusCode::BAD_REQUEST,
            _ => self
                .status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// User-safe description. Never includes the raw upstream body.
    pub fn user_message(&self) -> String {
        match self.kind {
            ProviderErrorKind::Credentials => {
                format!("{} rejected the supplied credentials", self.provider)
            }
            ProviderErrorKind::NotFound => format!("{} resource not found", self.provider),
            ProviderErrorKind::RateLimited => {
                format!("{} rate limit exceeded, try again later", self.provider)
            }
            ProviderErrorKind::Network => format!("Connection to {} failed", self.provider),
            ProviderErrorKind::Upstream => match self.status {
                Some(status) => format!("{} request failed (HTTP {})", self.provider, status),
                None => format!("Connection to {} failed", self.provider),
            },
        }
    }
}

fn classify(status: u16, code: Option<&str>, message: &str) -> ProviderErrorKind {
    if status == 401 || status == 403 {
        return ProviderErrorKind::Credentials;
    }
    if code.is_some_and(|c| AWS_AUTH_CODES.contains(&c)) {
        return ProviderErrorKind::Credentials;
    }
    let lower = message.to_ascii_lowercase();
    if AUTH_PHRASES.iter().any(|p| lower.contains(p)) {
        return ProviderErrorKind::Credentials;
    }
    match status {
        404 => ProviderErrorKind::NotFound,
        429 => ProviderErrorKind::RateLimited,
        _ => ProviderErrorKind::Upstream,
    }
}
