//! REST API client module for the readlens backend.
//!
//! This module provides the `ApiClient`, the authenticated request pipeline
//! every call goes through, plus request builders for the article endpoints.
//!
//! The API uses bearer access tokens issued by the login/register endpoints
//! and renewed through the refresh endpoint.

pub mod articles;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod request;

pub use client::{ApiClient, SessionExpiredEvent};
pub use error::ApiError;
pub use request::RequestDescriptor;
