//! Axum integration primitives for the atendimentos service.
//!
//! - [`AppError`]: maps resolver failures and infrastructure errors to HTTP
//!   responses using the `{ ok: false, error: { code, message } }` envelope
//! - [`CorrelationId`] and [`correlation_id_layer`]: per-request correlation
//!   ids, echoed in `X-Correlation-ID` and attached to an `http_request` span
//! - [`BearerToken`]: raw bearer credential extraction
//!
//! # Example
//!
//! ```ignore
//! use atendimentos_web::{correlation_id_layer, AppError, CorrelationId};
//! use axum::{routing::post, Json, Router};
//!
//! async fn lookup(
//!     correlation_id: CorrelationId,
//!     Json(body): Json<serde_json::Value>,
//! ) -> Result<Json<serde_json::Value>, AppError> {
//!     tracing::info!(%correlation_id, "Lookup requested");
//!     Ok(Json(body))
//! }
//!
//! let app = Router::new()
//!     .route("/api/clients/lookup", post(lookup))
//!     .layer(correlation_id_layer());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId};
pub use middleware::{correlation_id_layer, CORRELATION_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
