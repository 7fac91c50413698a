//! API client for the readlens backend.
//!
//! This module provides the `ApiClient`, which carries every outbound call
//! through the authenticated request pipeline: bearer attachment from the
//! credential store, one refresh-and-retry on a 401, and a clean session end
//! when the refresh itself fails.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{endpoints, ApiError, RequestDescriptor};
use crate::auth::{CredentialStore, TokenRefresher};

/// HTTP request timeout in seconds.
/// Extraction and summarisation can be slow; 30s still fails fast enough for a CLI.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Buffered session-expired notifications per subscriber.
const EXPIRED_CHANNEL_CAPACITY: usize = 16;

/// Emitted when a refresh is exhausted and the session has been cleared.
/// Front ends react by sending the user back to login.
#[derive(Debug, Clone)]
pub struct SessionExpiredEvent {
    /// Path of the request whose recovery failed
    pub path: String,
    pub reason: String,
    pub at: DateTime<Utc>,
}

impl SessionExpiredEvent {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
            at: Utc::now(),
        }
    }
}

/// API client for readlens.
/// Clone is cheap - reqwest::Client and the refresher are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: CredentialStore,
    refresher: Arc<TokenRefresher>,
    expired_tx: broadcast::Sender<SessionExpiredEvent>,
}

impl ApiClient {
    /// Create a new API client with the default request timeout
    pub fn new(base_url: impl Into<String>, credentials: CredentialStore) -> Result<Self, ApiError> {
        Self::with_timeout(
            base_url,
            credentials,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        credentials: CredentialStore,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into();
        let refresher = Arc::new(TokenRefresher::new(
            client.clone(), // Cheap clone, shares connection pool
            base_url.clone(),
            credentials.clone(),
        ));
        let (expired_tx, _) = broadcast::channel(EXPIRED_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            base_url,
            credentials,
            refresher,
            expired_tx,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn refresher(&self) -> &TokenRefresher {
        &self.refresher
    }

    /// Notifications for sessions ended by an exhausted refresh
    pub fn subscribe_session_expired(&self) -> broadcast::Receiver<SessionExpiredEvent> {
        self.expired_tx.subscribe()
    }

    /// Send a request with the stored access token, recovering once from an
    /// expired credential.
    ///
    /// A 401 on a descriptor that has not been retried triggers one refresh
    /// and one retry with the new token. A 401 on a retried descriptor is
    /// returned as `CredentialExpired`. If the refresh fails, both tokens are
    /// cleared, a `SessionExpiredEvent` is emitted and `SessionExpired` is
    /// returned. Every other failure is returned as classified by status.
    pub async fn authenticated_request(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<Response, ApiError> {
        let access_token = self.credentials.access_token()?;
        let response = self.dispatch(&descriptor, access_token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check_response(response).await;
        }

        if descriptor.is_retried() {
            debug!(path = %descriptor.path, "Credential rejected on retry, giving up");
            return Err(ApiError::CredentialExpired);
        }

        let retry = descriptor.into_retry();
        info!(path = %retry.path, "Access token rejected, refreshing");

        let pair = match self.refresher.refresh_stale(access_token.as_deref()).await {
            Ok(pair) => pair,
            Err(e) => return Err(self.expire_session(&retry.path, &e)),
        };

        let response = self.dispatch(&retry, Some(&pair.access_token)).await?;
        Self::check_response(response).await
    }

    /// `authenticated_request` followed by JSON decoding of the body
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T, ApiError> {
        let path = descriptor.path.clone();
        let response = self.authenticated_request(descriptor).await?;
        response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
        })
    }

    /// Send a request without credentials and without refresh handling.
    /// The response is returned whatever its status; the caller classifies it.
    pub async fn public_request(&self, descriptor: RequestDescriptor) -> Result<Response, ApiError> {
        self.dispatch(&descriptor, None).await
    }

    async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        access_token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = endpoints::join(&self.base_url, &descriptor.path);
        debug!(
            method = %descriptor.method,
            url = %url,
            authenticated = access_token.is_some(),
            retry = descriptor.is_retried(),
            "Sending request"
        );

        let mut request = self
            .client
            .request(descriptor.method.clone(), &url)
            .headers(descriptor.headers.clone());
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }
        if let Some(ref body) = descriptor.body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    fn expire_session(&self, path: &str, cause: &ApiError) -> ApiError {
        warn!(path = %path, error = %cause, "Credential refresh failed, ending session");

        if let Err(e) = self.credentials.clear_all() {
            warn!(error = %e, "Failed to clear stored tokens");
        }

        // No subscribers is fine
        let _ = self
            .expired_tx
            .send(SessionExpiredEvent::new(path, cause.to_string()));

        ApiError::SessionExpired
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}
