//! `PostgreSQL` client store for the atendimentos service.
//!
//! Implements [`ClientStore`](atendimentos_core::ClientStore) on a sqlx pool.
//! The schema lives in `migrations/` and is applied with
//! [`PostgresClientStore::migrate`].
//!
//! # Example
//!
//! ```ignore
//! use atendimentos_core::{ClientResolver, ResolverConfig};
//! use atendimentos_postgres::PostgresClientStore;
//! use std::sync::Arc;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresClientStore::connect("postgres://localhost/atendimentos", 10, 30).await?;
//!     store.migrate().await?;
//!     let resolver = ClientResolver::new(Arc::new(store), ResolverConfig::default());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client_store;

pub use client_store::PostgresClientStore;
