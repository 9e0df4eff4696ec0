// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON body extractors that reject malformed bodies in each service's
//! own error shape instead of axum's plain-text rejection.

use crate::error::{AppError, WebError};
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::ValidationErrors;

/// Message for any body that is not valid JSON for the route.
pub const INVALID_JSON: &str = "Invalid JSON body";

/// JSON body for backend routes. Rejects with [`AppError::BadRequest`].
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");
                Err(AppError::BadRequest(INVALID_JSON.to_string()))
            }
        }
    }
}

/// JSON body for browser-facing routes. Rejects with `{"error":"Invalid JSON body"}`.
pub struct WebJson<T>(pub T);

impl<T, S> FromRequest<S> for WebJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(WebJson(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");
                Err(WebError::bad_request(INVALID_JSON))
            }
        }
    }
}

/// First user-facing message out of a validator failure.
pub fn validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request".to_string())
}

/// Parse a path or query id, naming the parameter in the error.
pub fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("Invalid {}", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Body1 {
        #[allow(dead_code)]
        name: String,
    }

    #[tokio::test]
    async fn test_web_json_rejects_malformed_body() {
        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let err = match WebJson::<Body1>::from_request(req, &()).await {
            Ok(_) => panic!("malformed body accepted"),
            Err(e) => e,
        };
        assert_eq!(err.message, INVALID_JSON);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_json_accepts_valid_body() {
        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"x"}"#))
            .unwrap();
        assert!(ApiJson::<Body1>::from_request(req, &()).await.is_ok());
    }

    #[test]
    fn test_parse_uuid() {
        assert!(parse_uuid("not-a-uuid", "project id").is_err());
        assert!(parse_uuid(&Uuid::nil().to_string(), "project id").is_ok());
    }
}
