//! HTTP server wiring: state, routes, health checks.

pub mod health;
pub mod routes;
pub mod state;
