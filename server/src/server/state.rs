//! Application state for the atendimentos HTTP server.

use crate::auth::Authenticator;
use atendimentos_core::{ClientResolver, ClientStore, ResolverConfig};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Client identity resolution
    pub resolver: Arc<ClientResolver>,

    /// The store the resolver runs against, kept for readiness checks
    pub store: Arc<dyn ClientStore>,

    /// Bearer token validation
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The resolver is built over `store` with `resolver_config`.
    #[must_use]
    pub fn new(
        store: Arc<dyn ClientStore>,
        resolver_config: ResolverConfig,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            resolver: Arc::new(ClientResolver::new(Arc::clone(&store), resolver_config)),
            store,
            authenticator,
        }
    }
}
