//! HTTP API handlers.
//!
//! - `POST /api/clients/lookup`, `POST /api/clients/upsert`
//! - `POST /api/tickets/status`

pub mod clients;
pub mod tickets;
