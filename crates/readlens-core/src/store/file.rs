use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{StoreError, StoreResult, TokenKind, TokenStore};
use crate::models::TokenPair;

/// Credentials file name in cache directory
const CREDENTIALS_FILE: &str = "credentials.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl StoredTokens {
    fn slot(&mut self, kind: TokenKind) -> &mut Option<String> {
        match kind {
            TokenKind::AccessToken => &mut self.access_token,
            TokenKind::RefreshToken => &mut self.refresh_token,
        }
    }

    fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Token storage in a JSON file.
///
/// Every write replaces the whole file through a temporary sibling and a
/// rename, so readers never observe a half-written pair.
pub struct FileStore {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store `credentials.json` inside the given cache directory
    pub fn in_dir(cache_dir: &Path) -> Self {
        Self::new(cache_dir.join(CREDENTIALS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> StoreResult<StoredTokens> {
        if !self.path.exists() {
            return Ok(StoredTokens::default());
        }
        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        if contents.trim().is_empty() {
            return Ok(StoredTokens::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write(&self, tokens: &StoredTokens) -> StoreResult<()> {
        if tokens.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(tokens)?;
        std::fs::write(&tmp, contents).map_err(|e| StoreError::io(&tmp, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| StoreError::io(&tmp, e))?;
        }

        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "Credentials file written");
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut StoredTokens)) -> StoreResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut tokens = self.read()?;
        apply(&mut tokens);
        self.write(&tokens)
    }
}

impl TokenStore for FileStore {
    fn get(&self, kind: TokenKind) -> StoreResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut tokens = self.read()?;
        Ok(tokens.slot(kind).take())
    }

    fn set(&self, kind: TokenKind, token: &str) -> StoreResult<()> {
        self.update(|tokens| *tokens.slot(kind) = Some(token.to_string()))
    }

    fn clear(&self, kind: TokenKind) -> StoreResult<()> {
        self.update(|tokens| *tokens.slot(kind) = None)
    }

    fn set_pair(&self, pair: &TokenPair) -> StoreResult<()> {
        self.update(|tokens| {
            tokens.access_token = Some(pair.access_token.clone());
            tokens.refresh_token = Some(pair.refresh_token.clone());
        })
    }

    fn name(&self) -> &str {
        "file"
    }
}
