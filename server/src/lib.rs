//! # Atendimentos Server
//!
//! HTTP service for the support desk: client identity resolution and ticket
//! status derivation over a JSON API.
//!
//! ```text
//! GET  /health                liveness
//! GET  /ready                 client store reachability
//! POST /api/clients/lookup    find a client by cpf, email or name
//! POST /api/clients/upsert    create or partially update a client
//! POST /api/tickets/status    derive a ticket status from item statuses
//! ```
//!
//! Configuration comes from the environment; see [`Config::from_env`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod server;

pub use app::build_state;
pub use auth::{Authenticator, Principal, StaticTokenAuthenticator};
pub use config::Config;
pub use server::routes::build_router;
pub use server::state::AppState;
