//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request's correlation id
//! - [`BearerToken`]: the raw token from `Authorization: Bearer <token>`

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::fmt;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Prefers the id stored by [`correlation_id_layer`](crate::correlation_id_layer),
/// then a valid `X-Correlation-ID` header, and otherwise generates a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Bearer token extracted from `Authorization: Bearer <token>` header.
///
/// Rejects with 401 when the header is missing, not a bearer credential, or
/// empty. Whether the token is valid is up to the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

// Never print the secret.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?
            .trim();

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).expect("Valid request").into_parts().0
    }

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let mut parts = parts(Request::builder().header(CORRELATION_ID_HEADER, uuid.to_string()));

        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, uuid);
    }

    #[tokio::test]
    async fn test_correlation_id_prefers_extension() {
        let stored = CorrelationId(Uuid::new_v4());
        let mut parts =
            parts(Request::builder().header(CORRELATION_ID_HEADER, Uuid::new_v4().to_string()));
        parts.extensions.insert(stored);

        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id, stored);
    }

    #[tokio::test]
    async fn test_correlation_id_generates_new() {
        let mut parts = parts(Request::builder());
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_ne!(correlation_id.0, Uuid::nil());
    }

    #[tokio::test]
    async fn test_bearer_token_extracted() {
        let mut parts = parts(Request::builder().header(AUTHORIZATION, "Bearer s3cret"));
        let token = BearerToken::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(token.0, "s3cret");
        assert_eq!(format!("{token:?}"), "BearerToken(***)");
    }

    #[tokio::test]
    async fn test_bearer_token_rejections() {
        for header in [None, Some("Basic dXNlcjpwdw=="), Some("Bearer "), Some("Bearer    ")] {
            let mut builder = Request::builder();
            if let Some(value) = header {
                builder = builder.header(AUTHORIZATION, value);
            }
            let mut parts = parts(builder);

            let err = BearerToken::from_request_parts(&mut parts, &())
                .await
                .expect_err("Should reject");
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "header {header:?}");
        }
    }
}
