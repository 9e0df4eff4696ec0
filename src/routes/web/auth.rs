// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in, logout and the current-user route.

use crate::error::WebError;
use crate::routes::same_origin;
use crate::middleware::session::{
    create_session_token, expired_session_cookie, session_cookie, SessionClaims, SessionUser,
};
use crate::services::auth_bridge::ensure_internal_user;
use crate::WebState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// How long a sign-in may take between redirect and callback.
const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

/// Public sign-in routes.
pub fn routes() -> Router<Arc<WebState>> {
    Router::new()
        .route("/auth/google", get(auth_start))
        .route("/auth/google/callback", get(auth_callback))
        .route("/auth/logout", post(logout))
}

/// Routes that need a session.
pub fn session_routes() -> Router<Arc<WebState>> {
    Router::new().route("/api/me", get(get_me))
}

#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Where to land after sign-in. Must share the frontend URL's origin.
    #[serde(default)]
    redirect: Option<String>,
}

/// Start sign-in: redirect to Google's consent screen.
async fn auth_start(
    State(state): State<Arc<WebState>>,
    Query(params): Query<AuthStartParams>,
) -> Result<Redirect, WebError> {
    let frontend = &state.config.frontend_url;
    let return_url = params
        .redirect
        .filter(|url| same_origin(url, frontend))
        .unwrap_or_else(|| frontend.clone());

    let oauth_state = sign_state(&return_url, now_millis()?, &state.config.oauth_state_key)
        .ok_or_else(|| {
            tracing::error!("Failed to sign OAuth state");
            WebError::internal()
        })?;

    tracing::info!(return_url = %return_url, "Starting Google sign-in");
    Ok(Redirect::temporary(&state.google.authorize_url(&oauth_state)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Google callback: exchange the code, bind the user, set the session cookie.
async fn auth_callback(
    State(state): State<Arc<WebState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let frontend = state.config.frontend_url.clone();
    let fail = |reason: &str| {
        Redirect::temporary(&format!("{}?error={}", frontend, urlencoding::encode(reason)))
            .into_response()
    };

    let now = match now_millis() {
        Ok(now) => now,
        Err(e) => return e.into_response(),
    };
    let Some(return_url) = params
        .state
        .as_deref()
        .and_then(|s| verify_state(s, &state.config.oauth_state_key, now))
    else {
        tracing::warn!("Invalid, expired or tampered OAuth state");
        return fail("invalid_state");
    };

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return fail(&error);
    }
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return fail("missing_code");
    };

    let profile = match state.google.exchange_code(&code).await {
        Ok(access_token) => state.google.userinfo(&access_token).await,
        Err(e) => Err(e),
    };
    let profile = match profile {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!(error = %e, "Google sign-in failed");
            return fail("sign_in_failed");
        }
    };

    let mut claims = match SessionClaims::for_profile(&profile) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build session claims");
            return fail("sign_in_failed");
        }
    };
    // Fresh claims never carry uid, so this always upserts
    ensure_internal_user(&state.backend, &mut claims).await;

    let token = match create_session_token(&claims, &state.config.session_secret) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "Session token creation failed");
            return fail("sign_in_failed");
        }
    };

    tracing::info!(bound = claims.uid.is_some(), "Google sign-in complete");
    let jar = jar.add(session_cookie(token, state.config.secure_cookies()));
    (jar, Redirect::temporary(&return_url)).into_response()
}

/// Clear the session cookie.
async fn logout(State(state): State<Arc<WebState>>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(expired_session_cookie(state.config.secure_cookies()));
    (jar, StatusCode::NO_CONTENT)
}

async fn get_me(Extension(user): Extension<SessionUser>) -> Json<SessionUser> {
    Json(user)
}

// ─── OAuth state ─────────────────────────────────────────────

fn now_millis() -> Result<u128, WebError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .map_err(|e| {
            tracing::error!(error = %e, "System time error");
            WebError::internal()
        })
}

/// `base64url("return_url|timestamp_hex|signature_hex")`.
fn sign_state(return_url: &str, timestamp_ms: u128, key: &[u8]) -> Option<String> {
    let payload = format!("{}|{:x}", return_url, timestamp_ms);
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    Some(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify signature and age of a state parameter, returning its return URL.
fn verify_state(state: &str, key: &[u8], now_ms: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;

    // The URL itself may contain '|', so split from the right
    let mut parts = decoded.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let return_url = parts.next()?;

    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(format!("{}|{}", return_url, timestamp_hex).as_bytes());
    let signature = hex::decode(signature_hex).ok()?;
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch");
        return None;
    }

    let issued = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms.saturating_sub(issued) > STATE_MAX_AGE_MS {
        return None;
    }
    Some(return_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"secret_key";
    const NOW: u128 = 1_700_000_000_000;

    #[test]
    fn test_state_roundtrip() {
        let state = sign_state("http://localhost:3000/projects", NOW, KEY).unwrap();
        assert_eq!(
            verify_state(&state, KEY, NOW + 1_000),
            Some("http://localhost:3000/projects".to_string())
        );
    }

    #[test]
    fn test_state_wrong_key() {
        let state = sign_state("https://example.com", NOW, KEY).unwrap();
        assert_eq!(verify_state(&state, b"wrong_key", NOW), None);
    }

    #[test]
    fn test_state_tampered_url() {
        let state = sign_state("https://example.com", NOW, KEY).unwrap();
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(state).unwrap()).unwrap();
        let forged = URL_SAFE_NO_PAD.encode(decoded.replace("example.com", "evil.com"));
        assert_eq!(verify_state(&forged, KEY, NOW), None);
    }

    #[test]
    fn test_state_expires() {
        let state = sign_state("https://example.com", NOW, KEY).unwrap();
        assert_eq!(verify_state(&state, KEY, NOW + STATE_MAX_AGE_MS + 1), None);
    }
}
