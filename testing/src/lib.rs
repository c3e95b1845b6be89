//! # Atendimentos Testing
//!
//! Testing utilities for the atendimentos crates.
//!
//! This crate provides:
//! - [`InMemoryClientStore`]: constraint-enforcing, write-counting store
//! - [`FixedClock`]: deterministic time
//! - Fixtures for clients and request bodies
//! - proptest strategies for status derivation
//!
//! ## Example
//!
//! ```ignore
//! use atendimentos_testing::{fixtures, InMemoryClientStore};
//! use atendimentos_core::{ClientResolver, ResolverConfig};
//!
//! #[tokio::test]
//! async fn lookup_by_cpf() {
//!     let ana = fixtures::record("Ana", Some("12345678909"));
//!     let store = Arc::new(InMemoryClientStore::seeded([ana.clone()]));
//!     let resolver = ClientResolver::new(store, ResolverConfig::default());
//!
//!     let outcome = resolver
//!         .lookup_json(json!({ "cpf": "123.456.789-09" }))
//!         .await
//!         .unwrap();
//!     assert_eq!(outcome.data(), Some(&ana));
//! }
//! ```

pub mod client_store;

/// Mock implementations of environment traits.
pub mod mocks {
    use atendimentos_core::environment::Clock;
    use chrono::{DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use atendimentos_testing::mocks::FixedClock;
    /// use atendimentos_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Builders for clients and request bodies.
pub mod fixtures {
    use crate::mocks::test_clock;
    use atendimentos_core::environment::Clock;
    use atendimentos_core::{ClientId, ClientRecord, Cpf, NewClient};
    use serde_json::{json, Value};

    /// Create fields for a client in Recife/PE.
    ///
    /// An invalid `cpf` is silently dropped; use valid eleven-digit values.
    #[must_use]
    pub fn new_client(nome: &str, cpf: Option<&str>) -> NewClient {
        NewClient {
            nome: nome.to_string(),
            cpf: cpf.and_then(|raw| Cpf::parse(raw).ok()),
            email: None,
            cidade: "Recife".to_string(),
            estado_uf: "PE".to_string(),
            uso_plataforma: None,
            area_atuacao: None,
            unidade: None,
        }
    }

    /// A stored client with a fresh id.
    #[must_use]
    pub fn record(nome: &str, cpf: Option<&str>) -> ClientRecord {
        ClientRecord::from_new(ClientId::new(), new_client(nome, cpf), test_clock().now())
    }

    /// A stored client with an email.
    #[must_use]
    pub fn record_with_email(nome: &str, email: &str) -> ClientRecord {
        let mut record = record(nome, None);
        record.email = Some(email.to_string());
        record
    }

    /// A complete create body for the upsert endpoint.
    #[must_use]
    pub fn create_body(nome: &str, cpf: &str) -> Value {
        json!({
            "nome": nome,
            "cpf": cpf,
            "email": format!("{}@example.com", nome.to_lowercase().replace(' ', ".")),
            "cidade": "Recife",
            "estadoUf": "PE",
            "usoPlataforma": "Semanal",
            "areaAtuacao": "Psicologia",
            "unidade": "Clínica Norte"
        })
    }

    /// `body` with an `id` field, turning a create into an update.
    #[must_use]
    pub fn with_id(mut body: Value, id: ClientId) -> Value {
        if let Some(fields) = body.as_object_mut() {
            fields.insert("id".to_string(), json!(id.to_string()));
        }
        body
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use atendimentos_core::MotiveStatus;
    use proptest::prelude::*;

    /// Any single motive status.
    pub fn motive_status() -> impl Strategy<Value = MotiveStatus> {
        prop::sample::select(MotiveStatus::ALL.to_vec())
    }

    /// A list of statuses paired with a permutation of it.
    pub fn statuses_and_permutation(
        max_len: usize,
    ) -> impl Strategy<Value = (Vec<MotiveStatus>, Vec<MotiveStatus>)> {
        prop::collection::vec(motive_status(), 0..=max_len)
            .prop_flat_map(|statuses| (Just(statuses.clone()), Just(statuses).prop_shuffle()))
    }
}

// Re-export commonly used items
pub use client_store::InMemoryClientStore;
pub use mocks::{test_clock, FixedClock};
