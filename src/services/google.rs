// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth 2.0 sign-in client.
//!
//! Handles:
//! - Building the authorization redirect
//! - Exchanging the authorization code for an access token
//! - Fetching the OpenID userinfo profile

use crate::config::WebConfig;
use crate::services::provider::{Provider, ProviderError};
use serde::Deserialize;

const SCOPES: &str = "openid email profile";

/// Profile fields the session is built from.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Stable Google account id
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    redirect_uri: String,
}

impl GoogleOAuthClient {
    pub fn new(http: reqwest::Client, config: &WebConfig) -> Self {
        Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            auth_url: config.google_auth_url.clone(),
            token_url: config.google_token_url.clone(),
            userinfo_url: config.google_userinfo_url.clone(),
            redirect_uri: format!(
                "{}/auth/google/callback",
                config.public_url.trim_end_matches('/')
            ),
        }
    }

    /// URL of Google's consent screen carrying our signed `state`.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&prompt=select_account",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::network(Provider::Google, &e))?;

        let token: TokenResponse = check_response_json(response).await?;
        Ok(token.access_token)
    }

    pub async fn userinfo(&self, access_token: &str) -> Result<GoogleProfile, ProviderError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::network(Provider::Google, &e))?;

        check_response_json(response).await
    }
}

async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<GoogleErrorBody>(&body).ok();
        let code = parsed.as_ref().and_then(|p| p.error.clone());
        let message = parsed
            .and_then(|p| p.error_description)
            .unwrap_or_default();
        return Err(ProviderError::from_status(
            Provider::Google,
            status.as_u16(),
            code,
            message,
        ));
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::malformed(Provider::Google, format!("JSON parse error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url() {
        let client = GoogleOAuthClient::new(reqwest::Client::new(), &WebConfig::test_default());
        let url = client.authorize_url("abc");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?client_id=test_client_id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fgoogle%2Fcallback"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("state=abc"));
    }
}
