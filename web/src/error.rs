//! Error types for web handlers.
//!
//! [`AppError`] bridges domain failures and HTTP responses. The body always
//! uses the failure envelope shared with successful lookups and upserts:
//!
//! ```json
//! { "ok": false, "error": { "code": "NOT_FOUND", "message": "..." } }
//! ```

use atendimentos_core::{ErrorCode, Failure, ResolverError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// Code used for authentication failures. Not part of the resolver taxonomy.
pub const UNAUTHORIZED_CODE: &str = "UNAUTHORIZED";

/// Application error type for web handlers.
///
/// Business refusals ([`Failure`]) become 400 responses carrying their own
/// code. Infrastructure errors become 500 `UNKNOWN`; the cause is logged but
/// never sent to the caller.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<ClientRecord>, AppError> {
///     let outcome = state.resolver.lookup(&query).await?;
///     Ok(Json(outcome.into_result()?))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 with `code`.
    #[must_use]
    pub fn bad_request(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code.as_str(), message)
    }

    /// 401 `UNAUTHORIZED`.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED_CODE, message)
    }

    /// 500 `UNKNOWN`.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Unknown.as_str(), message)
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    ok: bool,
    error: ErrorBody<'a>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorEnvelope {
            ok: false,
            error: ErrorBody {
                code: &self.code,
                message: &self.message,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

/// Business refusals map to 400, except `UNKNOWN` which maps to 500.
impl From<Failure> for AppError {
    fn from(failure: Failure) -> Self {
        match failure.code {
            ErrorCode::Unknown => Self::internal(failure.message),
            code => Self::bad_request(code, failure.message),
        }
    }
}

impl From<ResolverError> for AppError {
    fn from(err: ResolverError) -> Self {
        Self::internal("An internal error occurred").with_source(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}
