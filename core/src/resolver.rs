//! Client identity resolution.
//!
//! [`ClientResolver`] decides, for an inbound lookup or upsert, which stored
//! client (if any) the request refers to and what single write to perform.
//!
//! # Lookup
//!
//! ```text
//! cpf   ─ 1 match → done │ 0 → next │ >1 → AMBIGUOUS
//! email ─ 1 match → done │ 0 → next │ >1 → AMBIGUOUS
//! nome  ─ 1 match → done │ 0 → NOT_FOUND │ >1 → AMBIGUOUS
//! ```
//!
//! # Upsert
//!
//! ```text
//! id present → must exist (else NOT_FOUND) → partial update
//! id absent  → cpf must be free (else CONFLICT, or merge under
//!              CreatePolicy::MergeExisting) → create
//! ```
//!
//! Business failures come back as [`Outcome::Failure`]. Only store outages
//! surface as `Err(ResolverError)`, and they are never retried here.

use crate::client::{ClientChanges, ClientId, ClientQuery, ClientRecord, NewClient, UpsertPayload};
use crate::cpf::Cpf;
use crate::outcome::{Failure, Outcome};
use crate::store::{ClientCriteria, ClientStore, StoreError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// What to do when a create carries a CPF that is already registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatePolicy {
    /// Refuse with `CONFLICT`
    #[default]
    Reject,
    /// Treat the create as a partial update of the existing client
    MergeExisting,
}

impl FromStr for CreatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" | "conflict" => Ok(Self::Reject),
            "merge" | "merge_existing" | "find_or_create" => Ok(Self::MergeExisting),
            other => Err(format!("Unknown create policy: {other}")),
        }
    }
}

/// Resolver configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Behavior on create with an already-registered CPF
    pub create_policy: CreatePolicy,
}

/// Unexpected failures that are not part of the outcome taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// The store failed for reasons unrelated to the request.
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

/// Result type for resolver operations.
pub type ResolveResult = Result<Outcome<ClientRecord>, ResolverError>;

/// Matches inbound client data against stored clients.
#[derive(Clone)]
pub struct ClientResolver {
    store: Arc<dyn ClientStore>,
    config: ResolverConfig,
}

impl ClientResolver {
    /// Create a resolver over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ClientStore>, config: ResolverConfig) -> Self {
        Self { store, config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Find the single client a query refers to.
    ///
    /// Strategies run in order CPF, email, name. The first one returning
    /// exactly one client wins; a strategy returning several stops the lookup
    /// with `AMBIGUOUS`. Read-only.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Store`] if the store fails.
    pub async fn lookup(&self, query: &ClientQuery) -> ResolveResult {
        let strategies = [
            query.cpf.clone().map(ClientCriteria::Cpf),
            query.email.clone().map(ClientCriteria::Email),
            query.nome.clone().map(ClientCriteria::Name),
        ];

        for criteria in strategies.into_iter().flatten() {
            let mut matches = self
                .store
                .find_clients(criteria.clone())
                .await
                .map_err(store_failure)?;
            tracing::debug!(
                strategy = criteria.strategy(),
                matches = matches.len(),
                "Client lookup strategy evaluated"
            );

            match matches.len() {
                0 => {},
                1 => {
                    if let Some(found) = matches.pop() {
                        return Ok(Outcome::Success(found));
                    }
                },
                n => {
                    tracing::info!(
                        strategy = criteria.strategy(),
                        matches = n,
                        "Ambiguous client lookup"
                    );
                    return Ok(Failure::ambiguous(format!(
                        "{n} clients match {}",
                        criteria.strategy()
                    ))
                    .into());
                },
            }
        }

        Ok(Failure::not_found("No client matches the query").into())
    }

    /// Parse an untyped lookup body, then [`lookup`](Self::lookup).
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Store`] if the store fails.
    pub async fn lookup_json(&self, body: serde_json::Value) -> ResolveResult {
        match ClientQuery::from_json(body) {
            Ok(query) => self.lookup(&query).await,
            Err(failure) => Ok(failure.into()),
        }
    }

    /// Create or partially update a client.
    ///
    /// Performs exactly one store write on success and none on failure.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Store`] if the store fails.
    pub async fn upsert(&self, payload: UpsertPayload) -> ResolveResult {
        match payload {
            UpsertPayload::Update { id, changes } => self.update(id, changes).await,
            UpsertPayload::Create(fields) => self.create(fields).await,
        }
    }

    /// Parse an untyped upsert body, then [`upsert`](Self::upsert).
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Store`] if the store fails.
    pub async fn upsert_json(&self, body: serde_json::Value) -> ResolveResult {
        match UpsertPayload::from_json(body) {
            Ok(payload) => self.upsert(payload).await,
            Err(failure) => Ok(failure.into()),
        }
    }

    async fn update(&self, id: ClientId, changes: ClientChanges) -> ResolveResult {
        let existing = self
            .store
            .find_clients(ClientCriteria::Id(id))
            .await
            .map_err(store_failure)?;
        if existing.is_empty() {
            return Ok(Failure::not_found(format!("Client {id} not found")).into());
        }

        if let Some(cpf) = &changes.cpf {
            if let Some(holder) = self.cpf_holder(cpf).await? {
                if holder.id != id {
                    return Ok(cpf_conflict("update", Some(holder.id)));
                }
            }
        }

        self.write_update(id, changes).await
    }

    async fn create(&self, fields: NewClient) -> ResolveResult {
        if let Some(cpf) = &fields.cpf {
            if let Some(holder) = self.cpf_holder(cpf).await? {
                return match self.config.create_policy {
                    CreatePolicy::Reject => Ok(cpf_conflict("create", Some(holder.id))),
                    CreatePolicy::MergeExisting => {
                        tracing::debug!(
                            client_id = %holder.id,
                            "Create matched an existing CPF, merging"
                        );
                        self.write_update(holder.id, fields.into_changes()).await
                    },
                };
            }
        }

        match self.store.create_client(fields).await {
            Ok(record) => {
                tracing::info!(client_id = %record.id, "Client created");
                Ok(Outcome::Success(record))
            },
            Err(StoreError::DuplicateCpf(_)) => Ok(cpf_conflict("create", None)),
            Err(e) => Err(store_failure(e)),
        }
    }

    async fn write_update(&self, id: ClientId, changes: ClientChanges) -> ResolveResult {
        match self.store.update_client(id, changes).await {
            Ok(record) => {
                tracing::info!(client_id = %record.id, "Client updated");
                Ok(Outcome::Success(record))
            },
            Err(StoreError::NotFound(id)) => {
                Ok(Failure::not_found(format!("Client {id} not found")).into())
            },
            Err(StoreError::DuplicateCpf(_)) => Ok(cpf_conflict("update", Some(id))),
            Err(e) => Err(store_failure(e)),
        }
    }

    /// The client currently holding `cpf`, if any.
    async fn cpf_holder(&self, cpf: &Cpf) -> Result<Option<ClientRecord>, ResolverError> {
        let mut holders = self
            .store
            .find_clients(ClientCriteria::Cpf(cpf.clone()))
            .await
            .map_err(store_failure)?;
        Ok(holders.pop())
    }
}

/// `holder` is the client found holding the CPF, or the update target when the
/// store rejected the write.
fn cpf_conflict(operation: &'static str, holder: Option<ClientId>) -> Outcome<ClientRecord> {
    match holder {
        Some(client_id) => {
            tracing::warn!(operation, %client_id, "CPF already registered to another client");
        },
        None => tracing::warn!(operation, "CPF already registered to another client"),
    }
    Failure::conflict("CPF is already registered to another client").into()
}

fn store_failure(error: StoreError) -> ResolverError {
    tracing::error!(error = %error, "Client store failure");
    ResolverError::Store(error)
}
