//! # Atendimentos Core
//!
//! Decision logic for the client support (atendimento) tracker.
//!
//! Two independent, stateless components live here:
//!
//! - **Status derivation** ([`status`]): collapses the statuses of a ticket's
//!   items into one overall [`TicketStatus`].
//! - **Client resolution** ([`resolver`]): matches inbound client data against
//!   stored clients by CPF, email or name, and decides whether an upsert
//!   creates or updates a record.
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell: no I/O outside the [`ClientStore`] trait
//! - Failures are values ([`Outcome`]); only infrastructure errors are `Err`
//! - Dependency injection via traits ([`ClientStore`], [`environment::Clock`])
//!
//! ## Example
//!
//! ```ignore
//! use atendimentos_core::*;
//!
//! let resolver = ClientResolver::new(store, ResolverConfig::default());
//! let outcome = resolver
//!     .lookup_json(serde_json::json!({ "cpf": "123.456.789-09" }))
//!     .await?;
//! ```

pub mod client;
pub mod cpf;
pub mod environment;
pub mod memory;
pub mod outcome;
pub mod resolver;
pub mod status;
pub mod store;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use client::{ClientChanges, ClientId, ClientQuery, ClientRecord, NewClient, UpsertPayload};
pub use cpf::{unmask_cpf, Cpf, CpfError};
pub use memory::MemoryClientStore;
pub use outcome::{ErrorCode, Failure, Outcome};
pub use resolver::{ClientResolver, CreatePolicy, ResolveResult, ResolverConfig, ResolverError};
pub use status::{derive_status, derive_status_from_labels, MotiveStatus, Ticket, TicketItem, TicketStatus};
pub use store::{ClientCriteria, ClientStore, StoreError, StoreFuture};
