// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token middleware for the browser-facing layer.

use crate::error::WebError;
use crate::services::auth_bridge::ensure_internal_user;
use crate::services::google::GoogleProfile;
use crate::WebState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Name of the HttpOnly session cookie.
pub const SESSION_COOKIE: &str = "threadspace_session";

const SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60; // 30 days

/// Session token claims.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (Google account id)
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Internal user id, attached by the auth bridge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uuid>,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

impl SessionClaims {
    /// Fresh claims for a profile that just signed in. No `uid` yet.
    pub fn for_profile(profile: &GoogleProfile) -> anyhow::Result<Self> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        Ok(Self {
            sub: profile.sub.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            uid: None,
            iat: now as usize,
            exp: (now + SESSION_TTL_SECS) as usize,
        })
    }
}

/// Signed-in user with an internal id, available to handlers as an extension.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

pub fn create_session_token(claims: &SessionClaims, signing_key: &[u8]) -> anyhow::Result<String> {
    Ok(encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Decode and verify a session token. Expired or tampered tokens yield `None`.
pub fn decode_session_token(token: &str, signing_key: &[u8]) -> Option<SessionClaims> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .ok()
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

pub fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Session token from the cookie, else from `Authorization: Bearer`.
fn presented_token(jar: &CookieJar, request: &Request) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Middleware that requires a session bound to an internal user.
///
/// A token without `uid` goes through the auth bridge first; when that
/// attaches an id the cookie is re-issued with the new token.
pub async fn require_session(
    State(state): State<Arc<WebState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let key = &state.config.session_secret;
    let Some(mut claims) = presented_token(&jar, &request).and_then(|t| decode_session_token(&t, key))
    else {
        return WebError::unauthorized().into_response();
    };

    let mut refreshed = None;
    if ensure_internal_user(&state.backend, &mut claims).await {
        match create_session_token(&claims, key) {
            Ok(token) => refreshed = Some(token),
            Err(e) => tracing::warn!(error = %e, "Failed to re-issue session token"),
        }
    }

    let Some(id) = claims.uid else {
        return WebError::unauthorized().into_response();
    };
    request.extensions_mut().insert(SessionUser {
        id,
        email: claims.email,
        name: claims.name,
    });

    let response = next.run(request).await;
    match refreshed {
        Some(token) => {
            let jar = jar.add(session_cookie(token, state.config.secure_cookies()));
            (jar, response).into_response()
        }
        None => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> SessionClaims {
        SessionClaims::for_profile(&GoogleProfile {
            sub: "google-123".into(),
            email: "ada@example.com".into(),
            name: Some("Ada".into()),
        })
        .unwrap()
    }

    #[test]
    fn test_token_roundtrip_keeps_missing_uid() {
        let key = b"session-key";
        let original = claims();
        let token = create_session_token(&original, key).unwrap();
        let decoded = decode_session_token(&token, key).unwrap();
        assert_eq!(decoded, original);
        assert!(decoded.uid.is_none());
        assert!(decode_session_token(&token, b"other-key").is_none());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let key = b"session-key";
        let mut expired = claims();
        expired.iat = 1_000;
        expired.exp = 2_000;
        let token = create_session_token(&expired, key).unwrap();
        assert!(decode_session_token(&token, key).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok".into(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));

        let cleared = expired_session_cookie(false);
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.max_age(), Some(time::Duration::ZERO));
    }
}
