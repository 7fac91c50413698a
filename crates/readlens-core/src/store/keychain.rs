use keyring::Entry;
use tracing::debug;

use super::{StoreResult, TokenKind, TokenStore};

/// Service name the tokens are filed under in the OS keychain
const SERVICE_NAME: &str = "readlens";

/// Token storage in the OS keychain, one entry per token name.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a custom service name (e.g. one per server profile)
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, kind: TokenKind) -> StoreResult<Entry> {
        Ok(Entry::new(&self.service, kind.key())?)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringStore {
    fn get(&self, kind: TokenKind) -> StoreResult<Option<String>> {
        match self.entry(kind)?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, kind: TokenKind, token: &str) -> StoreResult<()> {
        self.entry(kind)?.set_password(token)?;
        debug!(token = %kind, "Token stored in keychain");
        Ok(())
    }

    fn clear(&self, kind: TokenKind) -> StoreResult<()> {
        match self.entry(kind)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        "keyring"
    }
}
