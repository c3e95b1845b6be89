//! Router configuration.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{clients, tickets};
use atendimentos_web::correlation_id_layer;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - `GET /health`, `GET /ready` (no authentication)
/// - `POST /api/clients/lookup`, `POST /api/clients/upsert`
/// - `POST /api/tickets/status`
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/clients/lookup", post(clients::lookup_client))
        .route("/clients/upsert", post(clients::upsert_client))
        .route("/tickets/status", post(tickets::ticket_status));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
