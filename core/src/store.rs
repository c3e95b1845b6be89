//! Client store abstraction.
//!
//! The resolver never talks to a database directly. It issues reads and writes
//! through [`ClientStore`], which production backs with `PostgreSQL`
//! (`atendimentos-postgres`) or, for single-process deployments, with
//! [`MemoryClientStore`](crate::memory::MemoryClientStore).
//!
//! # Uniqueness
//!
//! Implementations must enforce CPF uniqueness atomically on both create and
//! update and report a collision as [`StoreError::DuplicateCpf`]. The resolver
//! also checks beforehand, but only the store's answer is authoritative.
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the
//! store can be shared as `Arc<dyn ClientStore>`.

use crate::client::{ClientChanges, ClientId, ClientRecord, NewClient};
use crate::cpf::Cpf;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Errors reported by a [`ClientStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another client already holds this CPF.
    #[error("CPF is already registered to another client")]
    DuplicateCpf(Cpf),

    /// No client with this id.
    #[error("Client not found: {0}")]
    NotFound(ClientId),

    /// The backend could not be reached or failed unexpectedly.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// How to search for clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientCriteria {
    /// Exact id
    Id(ClientId),
    /// Exact normalized CPF
    Cpf(Cpf),
    /// Exact email
    Email(String),
    /// Name, trimmed and compared case-insensitively
    Name(String),
}

impl ClientCriteria {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Cpf(_) => "cpf",
            Self::Email(_) => "email",
            Self::Name(_) => "nome",
        }
    }

    /// Whether `record` satisfies this criteria.
    ///
    /// Backends that filter in memory use this directly; SQL backends must
    /// express the same comparison.
    #[must_use]
    pub fn matches(&self, record: &ClientRecord) -> bool {
        match self {
            Self::Id(id) => record.id == *id,
            Self::Cpf(cpf) => record.cpf.as_ref() == Some(cpf),
            Self::Email(email) => record.email.as_deref() == Some(email.as_str()),
            Self::Name(name) => {
                normalize_name(&record.nome) == normalize_name(name)
            },
        }
    }
}

impl fmt::Display for ClientCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::Cpf(cpf) => write!(f, "cpf={cpf}"),
            Self::Email(email) => write!(f, "email={email}"),
            Self::Name(name) => write!(f, "nome={name}"),
        }
    }
}

/// Name comparison key: trimmed and lowercased.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Persistence for client records.
pub trait ClientStore: Send + Sync {
    /// Find every client matching `criteria`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend fails.
    fn find_clients(&self, criteria: ClientCriteria) -> StoreFuture<'_, Vec<ClientRecord>>;

    /// Insert a new client, assigning its id and creation time.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DuplicateCpf`] if the CPF is taken
    /// - [`StoreError::Unavailable`] if the backend fails
    fn create_client(&self, fields: NewClient) -> StoreFuture<'_, ClientRecord>;

    /// Apply a partial update and return the merged record.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no client has this id (nothing is written)
    /// - [`StoreError::DuplicateCpf`] if the new CPF belongs to another client
    /// - [`StoreError::Unavailable`] if the backend fails
    fn update_client(&self, id: ClientId, changes: ClientChanges) -> StoreFuture<'_, ClientRecord>;

    /// Cheap connectivity probe used by readiness checks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend cannot be reached.
    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}
