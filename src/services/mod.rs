// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth_bridge;
pub mod aws;
pub mod backend_client;
pub mod google;
pub mod integrations;
pub mod provider;
pub mod secrets;
pub mod vercel;

use std::time::Duration;

pub use auth_bridge::ensure_internal_user;
pub use aws::{AwsClient, AwsCredentials};
pub use backend_client::{BackendClient, BackendError, BackendResponse};
pub use google::{GoogleOAuthClient, GoogleProfile};
pub use integrations::IntegrationService;
pub use provider::{Provider, ProviderError, ProviderErrorKind};
pub use secrets::SecretBox;
pub use vercel::{VercelAuth, VercelClient, VercelCredentials, VercelSummary};

/// Shared outbound HTTP client. Every call it makes is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("threadspace/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
