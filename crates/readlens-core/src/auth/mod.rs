//! Credential handling.
//!
//! This module provides:
//! - `CredentialStore`: shared handle to the persisted access/refresh tokens
//! - `TokenRefresher`: exchanges the refresh token for a new pair
//!
//! Tokens are opaque; nothing here decodes or inspects them.

pub mod credentials;
pub mod refresh;

pub use credentials::CredentialStore;
pub use refresh::TokenRefresher;
