//! Client identity endpoints.
//!
//! Both endpoints take an untyped JSON body and answer with the outcome
//! envelope:
//!
//! - `200 { "ok": true, "data": ClientRecord }`
//! - `400 { "ok": false, "error": { "code", "message" } }` for business refusals
//! - `500 { "ok": false, "error": { "code": "UNKNOWN", ... } }` for store failures
//! - `401` without a valid bearer token

use crate::auth::Principal;
use crate::server::state::AppState;
use atendimentos_core::{ClientRecord, ErrorCode, Failure, Outcome, ResolverError};
use atendimentos_web::{AppError, CorrelationId, WebResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

/// Response for both client endpoints.
pub type ClientResponse = (StatusCode, Json<Outcome<ClientRecord>>);

// ============================================================================
// Handlers
// ============================================================================

/// Find the single client a query refers to.
///
/// # Endpoint
///
/// ```text
/// POST /api/clients/lookup
/// Authorization: Bearer <token>
///
/// { "cpf": "123.456.789-09", "email": "ana@example.com", "nome": "Ana Souza" }
/// ```
///
/// # Errors
///
/// Returns [`AppError`] (500 `UNKNOWN`) if the client store fails.
pub async fn lookup_client(
    State(state): State<AppState>,
    principal: Principal,
    correlation_id: CorrelationId,
    body: Result<Json<Value>, JsonRejection>,
) -> WebResult<ClientResponse> {
    tracing::debug!(%correlation_id, user = %principal.user, "Client lookup requested");

    let outcome = match body {
        Ok(Json(body)) => state.resolver.lookup_json(body).await,
        Err(rejection) => Ok(Failure::invalid_query(rejection.body_text()).into()),
    };

    Ok(respond("lookup", outcome.map_err(|e| failed("lookup", e))?))
}

/// Create a client, or partially update one when the body carries an `id`.
///
/// # Endpoint
///
/// ```text
/// POST /api/clients/upsert
/// Authorization: Bearer <token>
///
/// { "nome": "Ana Souza", "cpf": "12345678909", "cidade": "Recife", "estadoUf": "PE" }
/// ```
///
/// # Errors
///
/// Returns [`AppError`] (500 `UNKNOWN`) if the client store fails.
pub async fn upsert_client(
    State(state): State<AppState>,
    principal: Principal,
    correlation_id: CorrelationId,
    body: Result<Json<Value>, JsonRejection>,
) -> WebResult<ClientResponse> {
    tracing::debug!(%correlation_id, user = %principal.user, "Client upsert requested");

    let outcome = match body {
        Ok(Json(body)) => state.resolver.upsert_json(body).await,
        Err(rejection) => Ok(Failure::invalid_input(rejection.body_text()).into()),
    };

    let outcome = outcome.map_err(|e| failed("upsert", e))?;
    if let Outcome::Success(record) = &outcome {
        tracing::info!(
            %correlation_id,
            user = %principal.user,
            client_id = %record.id,
            "Client upserted"
        );
    }
    Ok(respond("upsert", outcome))
}

// ============================================================================
// Helpers
// ============================================================================

/// Status code for an outcome: 200 on success, 400 for business refusals.
#[must_use]
pub fn status_for<T>(outcome: &Outcome<T>) -> StatusCode {
    match outcome.code() {
        None => StatusCode::OK,
        Some(ErrorCode::Unknown) => StatusCode::INTERNAL_SERVER_ERROR,
        Some(_) => StatusCode::BAD_REQUEST,
    }
}

fn respond(operation: &'static str, outcome: Outcome<ClientRecord>) -> ClientResponse {
    let label = outcome.code().map_or("OK", |code| code.as_str());
    metrics::counter!("clients.requests", "operation" => operation, "outcome" => label)
        .increment(1);

    (status_for(&outcome), Json(outcome))
}

fn failed(operation: &'static str, error: ResolverError) -> AppError {
    metrics::counter!("clients.requests", "operation" => operation, "outcome" => "UNKNOWN")
        .increment(1);
    AppError::from(error)
}
