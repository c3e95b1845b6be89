//! In-memory client store for fast, deterministic testing.
//!
//! [`InMemoryClientStore`] wraps [`MemoryClientStore`], which enforces the
//! same CPF uniqueness constraint as the `PostgreSQL` schema. On top of it,
//! it counts writes so tests can assert "exactly one" or "zero", and can
//! simulate outages and stale reads.

#![allow(clippy::unwrap_used)] // Inspection helpers unwrap the lock
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after a test already panicked

use crate::mocks::test_clock;
use atendimentos_core::environment::Clock;
use atendimentos_core::store::{ClientCriteria, ClientStore, StoreError, StoreFuture};
use atendimentos_core::{ClientChanges, ClientId, ClientRecord, Cpf, MemoryClientStore, NewClient};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory [`ClientStore`] with test hooks.
///
/// # Example
///
/// ```
/// use atendimentos_testing::InMemoryClientStore;
/// use atendimentos_core::{ClientStore, ClientCriteria};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryClientStore::new();
/// let found = store.find_clients(ClientCriteria::Name("Ana".into())).await?;
/// assert!(found.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryClientStore {
    inner: MemoryClientStore,
    write_calls: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
    stale_cpf_reads: Arc<AtomicBool>,
}

impl std::fmt::Debug for InMemoryClientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryClientStore")
            .field("records", &self.len())
            .field("writes", &self.writes())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryClientStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryClientStore {
    /// Create an empty store stamping records with [`test_clock`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(test_clock()))
    }

    /// Create an empty store with a specific clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::wrap(MemoryClientStore::new(clock))
    }

    /// Insert records directly, bypassing constraints and write counters.
    #[must_use]
    pub fn seeded(records: impl IntoIterator<Item = ClientRecord>) -> Self {
        Self::wrap(MemoryClientStore::with_records(Arc::new(test_clock()), records))
    }

    fn wrap(inner: MemoryClientStore) -> Self {
        Self {
            inner,
            write_calls: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(AtomicUsize::new(0)),
            unavailable: Arc::new(AtomicBool::new(false)),
            stale_cpf_reads: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Number of stored clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// All stored clients, in insertion order.
    #[must_use]
    pub fn records(&self) -> Vec<ClientRecord> {
        self.inner.snapshot().unwrap()
    }

    /// Stored client by id.
    #[must_use]
    pub fn get(&self, id: ClientId) -> Option<ClientRecord> {
        self.records().into_iter().find(|r| r.id == id)
    }

    /// Number of clients holding `cpf`.
    #[must_use]
    pub fn count_cpf(&self, cpf: &Cpf) -> usize {
        self.records()
            .iter()
            .filter(|r| r.cpf.as_ref() == Some(cpf))
            .count()
    }

    /// Number of `create_client` / `update_client` calls, successful or not.
    #[must_use]
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Number of writes that changed the store.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make CPF lookups return nothing, as if a concurrent insert were not
    /// yet visible. The uniqueness constraint still holds on writes.
    pub fn set_stale_cpf_reads(&self, stale: bool) {
        self.stale_cpf_reads.store(stale, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn count_write<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if result.is_ok() {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        result
    }
}

impl ClientStore for InMemoryClientStore {
    fn find_clients(&self, criteria: ClientCriteria) -> StoreFuture<'_, Vec<ClientRecord>> {
        Box::pin(async move {
            self.check_available()?;
            if matches!(criteria, ClientCriteria::Cpf(_)) && self.stale_cpf_reads.load(Ordering::SeqCst) {
                return Ok(Vec::new());
            }
            self.inner.find_clients(criteria).await
        })
    }

    fn create_client(&self, fields: NewClient) -> StoreFuture<'_, ClientRecord> {
        Box::pin(async move {
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;
            self.count_write(self.inner.create_client(fields).await)
        })
    }

    fn update_client(&self, id: ClientId, changes: ClientChanges) -> StoreFuture<'_, ClientRecord> {
        Box::pin(async move {
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;
            self.count_write(self.inner.update_client(id, changes).await)
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check_available()?;
            self.inner.ping().await
        })
    }
}
