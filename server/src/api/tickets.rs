//! Ticket status endpoint.
//!
//! Recomputes a ticket's status from its item statuses after items change.

use crate::auth::Principal;
use atendimentos_core::{derive_status_from_labels, ErrorCode, TicketStatus};
use atendimentos_web::{AppError, WebResult};
use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};

/// Request for a ticket status.
#[derive(Debug, Deserialize)]
pub struct TicketStatusRequest {
    /// Current status label of every item on the ticket
    pub statuses: Vec<String>,
}

/// Derived ticket status.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TicketStatusResponse {
    /// The ticket's status
    pub status: TicketStatus,
}

/// Derive a ticket status from item status labels.
///
/// Labels are matched case-insensitively; unknown labels are tolerated.
///
/// # Endpoint
///
/// ```text
/// POST /api/tickets/status
/// Authorization: Bearer <token>
///
/// { "statuses": ["RESOLVIDO", "AGUARDANDO"] }
/// → { "status": "AGUARDANDO" }
/// ```
///
/// # Errors
///
/// Returns 400 `INVALID_INPUT` if the body is not `{ "statuses": [string] }`.
#[allow(clippy::unused_async)]
pub async fn ticket_status(
    principal: Principal,
    body: Result<Json<TicketStatusRequest>, JsonRejection>,
) -> WebResult<Json<TicketStatusResponse>> {
    let Json(request) =
        body.map_err(|rejection| AppError::bad_request(ErrorCode::InvalidInput, rejection.body_text()))?;

    let status = derive_status_from_labels(request.statuses.iter().map(String::as_str));
    tracing::debug!(
        user = %principal.user,
        items = request.statuses.len(),
        status = status.as_str(),
        "Ticket status derived"
    );

    Ok(Json(TicketStatusResponse { status }))
}
