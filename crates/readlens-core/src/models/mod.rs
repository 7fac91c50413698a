//! Data models exchanged with the readlens API.
//!
//! - `TokenPair`, `LoginRequest`, `RegisterRequest`: credential issuance
//! - `UserProfile`: identity endpoint payload, passed through untouched
//! - Article types: `ExtractResponse`, `ArticleList`, `TranslateResponse`, ...

pub mod article;
pub mod auth;
pub mod user;

pub use article::{ArticleEnvelope, ArticleList, ExtractResponse, TranslateResponse};
pub use auth::{LoginRequest, RefreshRequest, RegisterRequest, TokenPair};
pub use user::UserProfile;
