//! readlens core library.
//!
//! This crate owns the client-side session of a readlens user:
//! - `store`: durable persistence for the access/refresh token pair
//! - `auth`: the credential façade and the refresh coordinator
//! - `api`: the authenticated request pipeline and article endpoints
//! - `session`: the session state machine and login/register/logout
//! - `config`: user configuration and directory layout

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod session;
pub mod store;

pub use api::{ApiClient, ApiError, RequestDescriptor, SessionExpiredEvent};
pub use auth::{CredentialStore, TokenRefresher};
pub use config::{Config, CredentialBackend};
pub use models::{LoginRequest, RegisterRequest, TokenPair, UserProfile};
pub use session::{Session, SessionManager, SessionStatus};
pub use store::{FileStore, KeyringStore, MemoryStore, StoreError, TokenKind, TokenStore};
