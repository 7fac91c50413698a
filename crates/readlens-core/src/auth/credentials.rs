use std::sync::Arc;

use tracing::debug;

use crate::models::TokenPair;
use crate::store::{StoreResult, TokenKind, TokenStore};

/// Shared handle to the session tokens.
///
/// Clone is cheap - all clones point at the same backend. Only the refresh
/// coordinator and the auth actions write through it; the request pipeline
/// reads, and clears after an exhausted refresh.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn TokenStore>,
}

impl CredentialStore {
    pub fn new(backend: impl TokenStore + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_arc(backend: Arc<dyn TokenStore>) -> Self {
        Self { backend }
    }

    pub fn get(&self, kind: TokenKind) -> StoreResult<Option<String>> {
        self.backend.get(kind)
    }

    pub fn set(&self, kind: TokenKind, token: &str) -> StoreResult<()> {
        self.backend.set(kind, token)
    }

    pub fn clear(&self, kind: TokenKind) -> StoreResult<()> {
        self.backend.clear(kind)
    }

    pub fn access_token(&self) -> StoreResult<Option<String>> {
        self.get(TokenKind::AccessToken)
    }

    pub fn refresh_token(&self) -> StoreResult<Option<String>> {
        self.get(TokenKind::RefreshToken)
    }

    pub fn has_access_token(&self) -> StoreResult<bool> {
        Ok(self.access_token()?.is_some())
    }

    /// Replace both tokens with a freshly issued pair
    pub fn store_pair(&self, pair: &TokenPair) -> StoreResult<()> {
        self.backend.set_pair(pair)?;
        debug!(backend = self.backend.name(), "Stored new token pair");
        Ok(())
    }

    /// Forget both tokens. Attempts both even if the first clear fails.
    pub fn clear_all(&self) -> StoreResult<()> {
        let access = self.clear(TokenKind::AccessToken);
        let refresh = self.clear(TokenKind::RefreshToken);
        debug!(backend = self.backend.name(), "Cleared stored tokens");
        access.and(refresh)
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("backend", &self.backend.name())
            .finish()
    }
}
