//! Durable storage for the two session tokens.
//!
//! Provides the [`TokenStore`] trait and its backends:
//! - [`KeyringStore`] - OS keychain via the `keyring` crate
//! - [`FileStore`] - JSON file in the cache directory, replaced atomically
//! - [`MemoryStore`] - in-process map (tests, embedding)
//!
//! Tokens are opaque strings. Backends never inspect or validate them.

mod file;
mod keychain;
mod memory;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

use crate::models::TokenPair;

/// The two secrets a session is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    AccessToken,
    RefreshToken,
}

impl TokenKind {
    pub const ALL: [TokenKind; 2] = [TokenKind::AccessToken, TokenKind::RefreshToken];

    /// Name the token is persisted under.
    pub fn key(&self) -> &'static str {
        match self {
            TokenKind::AccessToken => "access_token",
            TokenKind::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt credential file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key/value persistence for session tokens.
///
/// Each call reads or replaces a single name atomically; the last writer
/// wins. Implementations must be shareable across tasks.
pub trait TokenStore: Send + Sync {
    /// Read a token, `None` when absent.
    fn get(&self, kind: TokenKind) -> StoreResult<Option<String>>;

    /// Replace a token.
    fn set(&self, kind: TokenKind, token: &str) -> StoreResult<()>;

    /// Remove a token. Removing an absent token is not an error.
    fn clear(&self, kind: TokenKind) -> StoreResult<()>;

    /// Replace both tokens. Backends that can write both in one step override this.
    ///
    /// The default writes one entry at a time, refresh token first. If the
    /// second write fails, the old access token stays next to the new refresh
    /// token, and the next 401 recovers through a refresh. A new access token
    /// is never paired with a spent refresh token.
    fn set_pair(&self, pair: &TokenPair) -> StoreResult<()> {
        self.set(TokenKind::RefreshToken, &pair.refresh_token)?;
        self.set(TokenKind::AccessToken, &pair.access_token)
    }

    /// Name of this storage backend.
    fn name(&self) -> &str {
        "unknown"
    }
}
