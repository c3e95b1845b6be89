//! Process-local client store.
//!
//! [`MemoryClientStore`] keeps every record behind one lock and checks CPF
//! uniqueness under the write lock, so it gives the same guarantees as the
//! `PostgreSQL` schema for a single process. Data is lost on restart.

use crate::client::{ClientChanges, ClientId, ClientRecord, NewClient};
use crate::cpf::Cpf;
use crate::environment::Clock;
use crate::store::{ClientCriteria, ClientStore, StoreError, StoreFuture};
use std::sync::{Arc, RwLock};

/// Lock-backed [`ClientStore`].
///
/// Clones share the same records.
#[derive(Clone)]
pub struct MemoryClientStore {
    records: Arc<RwLock<Vec<ClientRecord>>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for MemoryClientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryClientStore").finish_non_exhaustive()
    }
}

impl MemoryClientStore {
    /// Create an empty store stamping new records with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_records(clock, Vec::new())
    }

    /// Create a store holding `records` as given.
    ///
    /// The records are not checked against each other.
    #[must_use]
    pub fn with_records(clock: Arc<dyn Clock>, records: impl IntoIterator<Item = ClientRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records.into_iter().collect())),
            clock,
        }
    }

    /// All stored clients, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn snapshot(&self) -> Result<Vec<ClientRecord>, StoreError> {
        Ok(self.records.read().map_err(poisoned)?.clone())
    }

    fn find_sync(&self, criteria: &ClientCriteria) -> Result<Vec<ClientRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|r| criteria.matches(r))
            .cloned()
            .collect())
    }

    fn create_sync(&self, fields: NewClient) -> Result<ClientRecord, StoreError> {
        let mut records = self.records.write().map_err(poisoned)?;
        if let Some(cpf) = taken_cpf(&records, fields.cpf.as_ref(), None) {
            return Err(StoreError::DuplicateCpf(cpf));
        }

        let record = ClientRecord::from_new(ClientId::new(), fields, self.clock.now());
        records.push(record.clone());
        Ok(record)
    }

    fn update_sync(&self, id: ClientId, changes: &ClientChanges) -> Result<ClientRecord, StoreError> {
        let mut records = self.records.write().map_err(poisoned)?;
        if let Some(cpf) = taken_cpf(&records, changes.cpf.as_ref(), Some(id)) {
            return Err(StoreError::DuplicateCpf(cpf));
        }

        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        changes.apply_to(record);
        Ok(record.clone())
    }
}

impl ClientStore for MemoryClientStore {
    fn find_clients(&self, criteria: ClientCriteria) -> StoreFuture<'_, Vec<ClientRecord>> {
        Box::pin(async move { self.find_sync(&criteria) })
    }

    fn create_client(&self, fields: NewClient) -> StoreFuture<'_, ClientRecord> {
        Box::pin(async move { self.create_sync(fields) })
    }

    fn update_client(&self, id: ClientId, changes: ClientChanges) -> StoreFuture<'_, ClientRecord> {
        Box::pin(async move { self.update_sync(id, &changes) })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.records.read().map(|_| ()).map_err(poisoned) })
    }
}

/// The CPF, if a record other than `except` already holds it.
fn taken_cpf(records: &[ClientRecord], cpf: Option<&Cpf>, except: Option<ClientId>) -> Option<Cpf> {
    cpf.filter(|cpf| {
        records
            .iter()
            .any(|r| r.cpf.as_ref() == Some(*cpf) && Some(r.id) != except)
    })
    .cloned()
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::environment::SystemClock;

    fn store() -> MemoryClientStore {
        MemoryClientStore::new(Arc::new(SystemClock))
    }

    fn fields(nome: &str, cpf: Option<&str>) -> NewClient {
        NewClient {
            nome: nome.to_string(),
            cpf: cpf.map(|raw| Cpf::parse(raw).unwrap()),
            email: None,
            cidade: "Recife".to_string(),
            estado_uf: "PE".to_string(),
            uso_plataforma: None,
            area_atuacao: None,
            unidade: None,
        }
    }

    #[tokio::test]
    async fn create_then_find_by_cpf() {
        let store = store();
        let ana = store.create_client(fields("Ana", Some("123.456.789-09"))).await.unwrap();

        let found = store
            .find_clients(ClientCriteria::Cpf(Cpf::parse("12345678909").unwrap()))
            .await
            .unwrap();
        assert_eq!(found, vec![ana]);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_cpf_is_rejected_on_create_and_update() {
        let store = store();
        store.create_client(fields("Ana", Some("12345678909"))).await.unwrap();
        let bia = store.create_client(fields("Bia", None)).await.unwrap();

        let create = store.create_client(fields("Outra", Some("12345678909"))).await;
        assert!(matches!(create, Err(StoreError::DuplicateCpf(_))));

        let changes = ClientChanges {
            cpf: Some(Cpf::parse("12345678909").unwrap()),
            ..ClientChanges::default()
        };
        let update = store.update_client(bia.id, changes).await;
        assert!(matches!(update, Err(StoreError::DuplicateCpf(_))));
        assert_eq!(store.snapshot().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_keeps_own_cpf_and_reports_unknown_id() {
        let store = store();
        let ana = store.create_client(fields("Ana", Some("12345678909"))).await.unwrap();

        let changes = ClientChanges {
            cpf: ana.cpf.clone(),
            cidade: Some("Olinda".to_string()),
            ..ClientChanges::default()
        };
        let updated = store.update_client(ana.id, changes).await.unwrap();
        assert_eq!(updated.cidade, "Olinda");
        assert_eq!(updated.created_at, ana.created_at);

        let missing = store.update_client(ClientId::new(), ClientChanges::default()).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn clones_share_records() {
        let store = store();
        let other = store.clone();
        store.create_client(fields("Ana", None)).await.unwrap();
        assert_eq!(other.snapshot().unwrap().len(), 1);
    }
}
