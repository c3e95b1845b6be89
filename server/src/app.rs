//! Application bootstrap: builds the state a router runs on.

use crate::auth::StaticTokenAuthenticator;
use crate::config::{Config, StoreBackend};
use crate::server::state::AppState;
use anyhow::Context;
use atendimentos_core::environment::SystemClock;
use atendimentos_core::{ClientStore, MemoryClientStore};
use atendimentos_postgres::PostgresClientStore;
use std::sync::Arc;

/// Connect the configured client store and assemble the application state.
///
/// For the Postgres backend this connects the pool and runs migrations.
///
/// # Errors
///
/// Returns an error if the database cannot be reached or migrations fail.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let store: Arc<dyn ClientStore> = match config.store {
        StoreBackend::Postgres => {
            let store = PostgresClientStore::connect(
                &config.postgres.url,
                config.postgres.max_connections,
                config.postgres.connect_timeout,
            )
            .await
            .context("Failed to connect to PostgreSQL")?;
            store.migrate().await.context("Failed to run migrations")?;
            tracing::info!("✓ PostgreSQL client store ready");
            Arc::new(store)
        },
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory client store; data is lost on restart");
            Arc::new(MemoryClientStore::new(Arc::new(SystemClock)))
        },
    };

    let authenticator = StaticTokenAuthenticator::new(config.auth.tokens.iter().cloned());
    if authenticator.is_empty() {
        tracing::warn!("API_TOKENS is empty; every API request will be rejected");
    }

    Ok(AppState::new(
        store,
        config.resolver,
        Arc::new(authenticator),
    ))
}
