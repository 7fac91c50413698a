use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{StoreResult, TokenKind, TokenStore};
use crate::models::TokenPair;

/// In-memory token storage. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    tokens: Mutex<HashMap<TokenKind, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a stored pair, as if a previous run had logged in
    pub fn with_pair(pair: &TokenPair) -> Self {
        let store = Self::new();
        {
            let mut tokens = store.tokens();
            tokens.insert(TokenKind::AccessToken, pair.access_token.clone());
            tokens.insert(TokenKind::RefreshToken, pair.refresh_token.clone());
        }
        store
    }

    fn tokens(&self) -> MutexGuard<'_, HashMap<TokenKind, String>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, kind: TokenKind) -> StoreResult<Option<String>> {
        Ok(self.tokens().get(&kind).cloned())
    }

    fn set(&self, kind: TokenKind, token: &str) -> StoreResult<()> {
        self.tokens().insert(kind, token.to_string());
        Ok(())
    }

    fn clear(&self, kind: TokenKind) -> StoreResult<()> {
        self.tokens().remove(&kind);
        Ok(())
    }

    fn set_pair(&self, pair: &TokenPair) -> StoreResult<()> {
        let mut tokens = self.tokens();
        tokens.insert(TokenKind::AccessToken, pair.access_token.clone());
        tokens.insert(TokenKind::RefreshToken, pair.refresh_token.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
