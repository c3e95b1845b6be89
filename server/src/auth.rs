//! Caller authentication.
//!
//! Handlers take a [`Principal`] parameter to require an authenticated
//! caller. The principal is resolved from the bearer token by the state's
//! [`Authenticator`]; the client resolver never sees it.
//!
//! ```rust,ignore
//! async fn lookup(principal: Principal, /* ... */) -> Result<..., AppError> {
//!     tracing::info!(user = %principal.user, "Lookup requested");
//!     // ...
//! }
//! ```

use crate::server::state::AppState;
use atendimentos_web::{AppError, BearerToken};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::collections::HashMap;
use std::sync::Arc;

/// An authenticated API caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Name of the user or integration the token belongs to
    pub user: String,
}

/// Maps bearer tokens to principals.
pub trait Authenticator: Send + Sync {
    /// The principal owning `token`, or `None` if the token is not accepted.
    fn authenticate(&self, token: &str) -> Option<Principal>;
}

/// Fixed token table, loaded from configuration at startup.
#[derive(Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl StaticTokenAuthenticator {
    /// Build from `(token, user)` pairs.
    #[must_use]
    pub fn new(tokens: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// Number of accepted tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// `true` when no token is accepted, i.e. every request is rejected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl std::fmt::Debug for StaticTokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenAuthenticator")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).map(|user| Principal { user: user.clone() })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;
        let authenticator: Arc<dyn Authenticator> = AppState::from_ref(state).authenticator;

        authenticator.authenticate(&bearer.0).ok_or_else(|| {
            metrics::counter!("auth.rejected").increment(1);
            tracing::warn!("Rejected unknown bearer token");
            AppError::unauthorized("Invalid bearer token")
        })
    }
}
